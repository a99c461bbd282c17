//! Interactive HTML demo generation from recent conversation.

use super::digest::{Speakers, transcript};
use crate::prompts::{DEMO_GENERATION, PromptLibrary};
use minijinja::context;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::session::Message;

const DEMO_SYSTEM_PROMPT: &str = "You are an expert at creating interactive educational visualizations. You create self-contained HTML demos that help learners understand concepts through interaction. Your demos are clean, functional, and focused on the learning objective. Always output only valid HTML - no markdown formatting, no code blocks, no explanations.";

/// Messages quoted as conversation context.
pub const DEMO_CONTEXT_MESSAGES: usize = 6;
pub const DEFAULT_DEMO_TITLE: &str = "Interactive Demo";

static TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<title>([^<]+)</title>").expect("Invalid regex"));

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DemoResult {
    pub success: bool,
    pub title: Option<String>,
    pub html: Option<String>,
    pub error: Option<String>,
    pub cli_not_found: bool,
}

impl DemoResult {
    fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

pub struct DemoGenerator {
    agent: Arc<dyn CompletionAgent>,
    prompts: Arc<PromptLibrary>,
}

impl DemoGenerator {
    pub fn new(agent: Arc<dyn CompletionAgent>, prompts: Arc<PromptLibrary>) -> Self {
        Self { agent, prompts }
    }

    pub async fn generate(&self, messages: &[Message]) -> DemoResult {
        if messages.is_empty() {
            return DemoResult::failed("No conversation context available");
        }

        let start = messages.len().saturating_sub(DEMO_CONTEXT_MESSAGES);
        let lines = transcript(&messages[start..], Speakers::Chat);
        let prompt = match self.prompts.render(DEMO_GENERATION, context! { lines => lines }) {
            Ok(prompt) => prompt,
            Err(e) => return DemoResult::failed(e.to_string()),
        };

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(DEMO_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found {
            return DemoResult {
                cli_not_found: true,
                ..DemoResult::failed("Claude CLI not found")
            };
        }
        if let Some(error) = response.error.filter(|_| response.content.is_empty()) {
            return DemoResult::failed(error);
        }

        let html = response.content.trim();
        if !html.contains("<!DOCTYPE html>") && !html.contains("<html") {
            tracing::debug!("Demo reply was not HTML ({} chars)", html.len());
            return DemoResult::failed("Invalid HTML response from Claude");
        }

        DemoResult {
            success: true,
            title: Some(extract_title(html)),
            html: Some(html.to_string()),
            error: None,
            cli_not_found: false,
        }
    }
}

/// The document `<title>`, or [`DEFAULT_DEMO_TITLE`].
pub fn extract_title(html: &str) -> String {
    TITLE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|title| !title.is_empty())
        .unwrap_or_else(|| DEFAULT_DEMO_TITLE.to_string())
}
