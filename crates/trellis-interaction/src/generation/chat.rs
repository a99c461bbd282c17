//! Tutor chat turn.

use super::digest::{Speakers, transcript};
use crate::system_prompt::with_knowledge_context;
use std::sync::Arc;
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::session::{Message, MessageRole, PromptContext};

/// What came back from a chat turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatReply {
    Text(String),
    /// The CLI executable is missing; the shell should show onboarding
    CliNotFound(String),
    Error(String),
}

#[derive(Debug, Clone)]
pub struct ChatOutcome {
    pub reply: ChatReply,
    /// Present whenever a request was actually sent
    pub prompt_context: Option<PromptContext>,
}

pub struct ChatService {
    agent: Arc<dyn CompletionAgent>,
}

impl ChatService {
    pub fn new(agent: Arc<dyn CompletionAgent>) -> Self {
        Self { agent }
    }

    /// Sends the conversation so far. The last message must be from the user.
    ///
    /// A single message is sent as-is; longer histories are flattened into a
    /// `User: ...` / `Assistant: ...` transcript.
    pub async fn send(
        &self,
        history: &[Message],
        system_prompt: &str,
        knowledge_context: Option<&str>,
    ) -> ChatOutcome {
        let Some(last) = history.last().filter(|m| m.role == MessageRole::User) else {
            return ChatOutcome {
                reply: ChatReply::Error("No user message to send".to_string()),
                prompt_context: None,
            };
        };

        let system_prompt = with_knowledge_context(system_prompt, knowledge_context);
        let prompt = if history.len() == 1 {
            last.content.clone()
        } else {
            transcript(history, Speakers::Chat)
                .into_iter()
                .map(|line| format!("{}: {}", line.speaker, line.content))
                .collect::<Vec<_>>()
                .join("\n\n")
        };

        let prompt_context = PromptContext {
            system_prompt: system_prompt.clone(),
            full_prompt: prompt.clone(),
            knowledge_context: knowledge_context
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        };

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(system_prompt))
            .await;

        let reply = if response.cli_not_found {
            ChatReply::CliNotFound(
                response
                    .error
                    .unwrap_or_else(|| "Claude CLI not found".to_string()),
            )
        } else if response.is_failure() {
            ChatReply::Error(response.error.unwrap_or_default())
        } else {
            ChatReply::Text(response.content)
        };

        ChatOutcome {
            reply,
            prompt_context: Some(prompt_context),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::ScriptedAgent;
    use trellis_core::agent::CompletionResponse;

    #[tokio::test]
    async fn test_single_message_sent_verbatim() {
        let agent = Arc::new(ScriptedAgent::replying("Ownership is..."));
        let service = ChatService::new(agent.clone());

        let history = vec![Message::user("s1", "Explain ownership")];
        let outcome = service.send(&history, "Tutor.", None).await;

        assert_eq!(outcome.reply, ChatReply::Text("Ownership is...".to_string()));
        let request = &agent.requests()[0];
        assert_eq!(request.prompt, "Explain ownership");
        assert_eq!(request.system_prompt.as_deref(), Some("Tutor."));
        let context = outcome.prompt_context.unwrap();
        assert_eq!(context.full_prompt, "Explain ownership");
        assert!(context.knowledge_context.is_none());
    }

    #[tokio::test]
    async fn test_history_flattened_with_knowledge_context() {
        let agent = Arc::new(ScriptedAgent::replying("Sure"));
        let service = ChatService::new(agent.clone());

        let history = vec![
            Message::user("s1", "Hi"),
            Message::assistant("s1", "Hello!"),
            Message::user("s1", "More please"),
        ];
        let outcome = service
            .send(&history, "Tutor.", Some("The student has previously explored:"))
            .await;

        let request = &agent.requests()[0];
        assert_eq!(request.prompt, "User: Hi\n\nAssistant: Hello!\n\nUser: More please");
        assert_eq!(
            request.system_prompt.as_deref(),
            Some("Tutor.\n\nPrior knowledge context:\nThe student has previously explored:")
        );
        assert_eq!(
            outcome.prompt_context.unwrap().knowledge_context.as_deref(),
            Some("The student has previously explored:")
        );
    }

    #[tokio::test]
    async fn test_requires_trailing_user_message() {
        let agent = Arc::new(ScriptedAgent::default());
        let service = ChatService::new(agent.clone());

        let outcome = service
            .send(&[Message::assistant("s1", "Hello")], "Tutor.", None)
            .await;
        assert!(matches!(outcome.reply, ChatReply::Error(_)));
        assert!(outcome.prompt_context.is_none());
        assert_eq!(agent.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failures_map_to_reply_kinds() {
        let agent = Arc::new(ScriptedAgent::with(vec![
            CompletionResponse::not_found("Claude CLI not found: No such file"),
            CompletionResponse::failed("rate limited"),
        ]));
        let service = ChatService::new(agent);
        let history = vec![Message::user("s1", "Hi")];

        let first = service.send(&history, "Tutor.", None).await;
        assert!(matches!(first.reply, ChatReply::CliNotFound(_)));

        let second = service.send(&history, "Tutor.", None).await;
        assert_eq!(second.reply, ChatReply::Error("rate limited".to_string()));
    }
}
