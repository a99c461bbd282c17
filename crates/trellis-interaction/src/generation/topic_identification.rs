//! Topic identification from a first message, and matching against
//! existing topics.

use crate::json_extract::parse_json_object;
use crate::prompts::{PromptLibrary, TOPIC_IDENTIFICATION, TOPIC_MATCHING};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::topic::Topic;

const IDENTIFICATION_SYSTEM_PROMPT: &str =
    "You are a topic identification assistant. Return only valid JSON.";
const MATCHING_SYSTEM_PROMPT: &str = "You are a topic matching assistant. Return only valid JSON.";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentifiedTopic {
    #[serde(default)]
    pub topic_name: String,
    #[serde(default)]
    pub topic_category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicMatch {
    pub topic_id: String,
    pub topic_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MatchReply {
    #[serde(default)]
    matched_topic_name: Option<String>,
}

pub struct TopicIdentifier {
    agent: Arc<dyn CompletionAgent>,
    prompts: Arc<PromptLibrary>,
}

impl TopicIdentifier {
    pub fn new(agent: Arc<dyn CompletionAgent>, prompts: Arc<PromptLibrary>) -> Self {
        Self { agent, prompts }
    }

    /// Identifies the topic a message is about. Any failure yields `None`.
    pub async fn identify(&self, user_message: &str) -> Option<IdentifiedTopic> {
        if user_message.trim().is_empty() {
            return None;
        }

        let prompt = self
            .prompts
            .render(TOPIC_IDENTIFICATION, context! { message => user_message })
            .map_err(|e| tracing::warn!("Topic identification prompt failed: {}", e))
            .ok()?;

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(IDENTIFICATION_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found || response.error.is_some() {
            return None;
        }

        let content = response.content.trim();
        if content.eq_ignore_ascii_case("null") {
            return None;
        }

        let identified: IdentifiedTopic = parse_json_object(content)
            .map_err(|e| tracing::debug!("Unusable topic identification reply: {:?}", e))
            .ok()?;
        if identified.topic_name.trim().is_empty() {
            return None;
        }
        Some(identified)
    }

    /// Asks the agent whether `identified` is the same subject as one of
    /// `existing_topics`. The reply is mapped back by case-insensitive name.
    pub async fn find_matching_topic(
        &self,
        identified: &IdentifiedTopic,
        existing_topics: &[Topic],
    ) -> Option<TopicMatch> {
        if existing_topics.is_empty() {
            return None;
        }

        let labels: Vec<String> = existing_topics.iter().map(Topic::label).collect();
        let prompt = self
            .prompts
            .render(
                TOPIC_MATCHING,
                context! {
                    new_topic => &identified.topic_name,
                    new_category => &identified.topic_category,
                    existing_topics => labels,
                },
            )
            .map_err(|e| tracing::warn!("Topic matching prompt failed: {}", e))
            .ok()?;

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(MATCHING_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found || response.error.is_some() {
            return None;
        }

        let reply: MatchReply = parse_json_object(&response.content).ok()?;
        let matched_name = reply.matched_topic_name.filter(|name| !name.is_empty())?;

        existing_topics
            .iter()
            .find(|topic| topic.has_name(&matched_name))
            .map(|topic| TopicMatch {
                topic_id: topic.id.clone(),
                topic_name: topic.name.clone(),
            })
    }
}
