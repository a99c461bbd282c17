//! Dashboard feed generation.

use super::digest::topic_digest;
use super::{CLI_NOT_FOUND, INVALID_RESPONSE_FORMAT};
use crate::json_extract::{JsonExtractError, parse_json_object};
use crate::prompts::{FEED_GENERATION, PromptLibrary, TopicDigest};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::concept::Concept;
use trellis_core::feed::{CardType, DashboardCard};
use trellis_core::topic::Topic;

const FEED_SYSTEM_PROMPT: &str = "You are a learning dashboard assistant. Return only valid JSON.";
const FEED_FAILED: &str = "Failed to generate feed";

/// Topics included in the learning history.
pub const MAX_HISTORY_TOPICS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedResult {
    pub cards: Vec<DashboardCard>,
    pub error: Option<String>,
}

impl FeedResult {
    fn fallback(error: impl Into<String>) -> Self {
        Self {
            cards: default_cards(),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct FeedReply {
    cards: Vec<CardReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CardReply {
    #[serde(rename = "type")]
    card_type: CardType,
    title: String,
    description: String,
    #[serde(default)]
    topic_id: Option<String>,
    #[serde(default)]
    suggested_prompt: Option<String>,
}

/// The three discover cards shown to a learner with no history.
pub fn default_cards() -> Vec<DashboardCard> {
    vec![
        DashboardCard::new(
            CardType::Discover,
            "Start Learning",
            "Begin your learning journey by exploring any topic that interests you.",
        )
        .with_prompt("I want to learn something new. Can you suggest some interesting topics?"),
        DashboardCard::new(
            CardType::Discover,
            "Explore Programming",
            "Learn about programming concepts, languages, and best practices.",
        )
        .with_prompt("I want to learn programming. Where should I start?"),
        DashboardCard::new(
            CardType::Discover,
            "Discover Science",
            "Explore fascinating scientific concepts from physics to biology.",
        )
        .with_prompt("Teach me about an interesting scientific concept."),
    ]
}

pub struct FeedGenerator {
    agent: Arc<dyn CompletionAgent>,
    prompts: Arc<PromptLibrary>,
}

impl FeedGenerator {
    pub fn new(agent: Arc<dyn CompletionAgent>, prompts: Arc<PromptLibrary>) -> Self {
        Self { agent, prompts }
    }

    /// Generates feed cards from the learner's topics (most recent first).
    ///
    /// With no topics the default cards are returned without an agent call.
    pub async fn generate_feed(&self, topics: &[Topic], concepts: &[Concept]) -> FeedResult {
        if topics.is_empty() {
            return FeedResult {
                cards: default_cards(),
                error: None,
            };
        }

        let history: Vec<TopicDigest> = topics
            .iter()
            .take(MAX_HISTORY_TOPICS)
            .map(|topic| topic_digest(topic, concepts))
            .collect();
        let prompt = match self
            .prompts
            .render(FEED_GENERATION, context! { topics => history })
        {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Feed prompt failed: {}", e);
                return FeedResult::fallback(FEED_FAILED);
            }
        };

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(FEED_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found {
            return FeedResult::fallback(CLI_NOT_FOUND);
        }
        if response.is_failure() {
            return FeedResult::fallback(response.error.unwrap_or_else(|| FEED_FAILED.to_string()));
        }

        match parse_json_object::<FeedReply>(&response.content) {
            Ok(reply) => FeedResult {
                cards: reply.cards.into_iter().map(into_card).collect(),
                error: None,
            },
            Err(JsonExtractError::NoObject) => FeedResult::fallback(INVALID_RESPONSE_FORMAT),
            Err(JsonExtractError::Malformed(e)) => {
                tracing::warn!("Malformed feed reply: {}", e);
                FeedResult::fallback(FEED_FAILED)
            }
        }
    }
}

fn into_card(reply: CardReply) -> DashboardCard {
    let mut card = DashboardCard::new(reply.card_type, reply.title, reply.description);
    card.topic_id = reply.topic_id.filter(|id| !id.is_empty());
    card.suggested_prompt = reply.suggested_prompt;
    card
}
