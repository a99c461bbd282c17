//! Completion agent port.
//!
//! Every piece of generated content (chat replies, topic identification,
//! knowledge extraction, feed cards, summaries, demos) goes through a
//! [`CompletionAgent`]. The production implementation shells out to a local
//! CLI; tests script their own.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single non-streaming completion request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// The text actually handed to the CLI.
    pub fn full_prompt(&self) -> String {
        match &self.system_prompt {
            Some(system) => format!("{}\n\nUser: {}", system, self.prompt),
            None => self.prompt.clone(),
        }
    }
}

/// Outcome of a completion call.
///
/// Agent failures are data, not errors: callers decide whether a missing CLI
/// or an error string means onboarding, an inline message, or a fallback.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub error: Option<String>,
    /// Set when the CLI executable could not be spawned at all
    #[serde(default)]
    pub cli_not_found: bool,
}

impl CompletionResponse {
    pub fn ok(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            error: None,
            cli_not_found: false,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            error: Some(error.into()),
            cli_not_found: false,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self {
            content: String::new(),
            error: Some(error.into()),
            cli_not_found: true,
        }
    }

    /// True when there is an error and nothing usable came back.
    pub fn is_failure(&self) -> bool {
        self.cli_not_found || (self.error.is_some() && self.content.is_empty())
    }
}

/// Result of probing the CLI installation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliStatus {
    pub installed: bool,
    pub authenticated: bool,
    pub account: Option<String>,
    pub error: Option<String>,
    /// `version_check`, `version_check_timeout`, `auth_check` or `auth_check_timeout`
    pub step_failed: Option<String>,
}

#[async_trait]
pub trait CompletionAgent: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> CompletionResponse;

    /// Human-readable name used in logs.
    fn name(&self) -> &str {
        "agent"
    }
}
