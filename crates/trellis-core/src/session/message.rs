//! Conversation message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents the role of a message in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the learner.
    User,
    /// Message from the tutor.
    Assistant,
}

impl MessageRole {
    /// Speaker label used when a conversation is flattened into a chat prompt.
    pub fn chat_label(&self) -> &'static str {
        match self {
            MessageRole::User => "User",
            MessageRole::Assistant => "Assistant",
        }
    }

    /// Speaker label used in analysis prompts.
    pub fn classroom_label(&self) -> &'static str {
        match self {
            MessageRole::User => "Student",
            MessageRole::Assistant => "Teacher",
        }
    }
}

/// The exact prompt sent for a reply, kept for user inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext {
    pub system_prompt: String,
    pub full_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_context: Option<String>,
}

/// A single message in a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_context: Option<PromptContext>,
}

impl Message {
    pub fn new(session_id: impl Into<String>, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id: crate::generate_id(),
            session_id: session_id.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
            prompt_context: None,
        }
    }

    pub fn user(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageRole::User, content)
    }

    pub fn assistant(session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(session_id, MessageRole::Assistant, content)
    }

    pub fn with_prompt_context(mut self, context: PromptContext) -> Self {
        self.prompt_context = Some(context);
        self
    }
}
