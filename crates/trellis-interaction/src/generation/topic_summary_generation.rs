//! Per-topic knowledge graph and follow-up suggestion generation.

use super::digest::{Speakers, transcript};
use super::{CLI_NOT_FOUND, INVALID_RESPONSE_FORMAT};
use crate::json_extract::{JsonExtractError, parse_json_object};
use crate::prompts::{PromptLibrary, TOPIC_SUMMARY};
use minijinja::context;
use serde::Deserialize;
use std::sync::Arc;
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::concept::{Concept, FamiliarityLevel};
use trellis_core::session::Message;
use trellis_core::summary::{
    KnowledgeGraphNode, MAX_GRAPH_DEPTH, SuggestionType, TopicSuggestion,
};
use trellis_core::topic::Topic;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are a learning assistant analyzing a student's topic exploration. Return only valid JSON.";
const SUMMARY_FAILED: &str = "Failed to generate topic summary";

/// Most recent messages quoted as excerpts.
pub const MAX_EXCERPT_MESSAGES: usize = 20;
/// Characters kept from each excerpt before truncation.
pub const EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummaryResult {
    pub knowledge_graph: Vec<KnowledgeGraphNode>,
    pub follow_up_suggestions: Vec<TopicSuggestion>,
    pub error: Option<String>,
}

impl TopicSummaryResult {
    fn fallback(topic: &Topic, error: impl Into<String>) -> Self {
        Self {
            knowledge_graph: Vec::new(),
            follow_up_suggestions: default_suggestions(topic),
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryReply {
    #[serde(default)]
    knowledge_graph: Vec<NodeReply>,
    #[serde(default)]
    follow_up_suggestions: Vec<SuggestionReply>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeReply {
    concept_name: String,
    #[serde(default)]
    familiarity_level: FamiliarityLevel,
    #[serde(default)]
    children: Vec<NodeReply>,
    #[serde(default)]
    related_concepts: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SuggestionReply {
    title: String,
    description: String,
    suggested_prompt: String,
    #[serde(rename = "type")]
    suggestion_type: SuggestionType,
}

/// Two suggestions of each type, phrased around the topic name.
pub fn default_suggestions(topic: &Topic) -> Vec<TopicSuggestion> {
    let name = &topic.name;
    vec![
        TopicSuggestion::new(
            SuggestionType::Deepen,
            format!("What makes {} fascinating?", name),
            "Discover the deeper aspects that make this subject compelling.",
            format!(
                "What are the most fascinating or surprising aspects of {} that most people don't know about?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Deepen,
            "The fundamentals matter",
            "Build a solid foundation before exploring further.",
            format!(
                "What are the core principles or fundamentals I should understand about {}?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Connect,
            "Unexpected connections",
            "See how this topic relates to other fields.",
            format!(
                "How does {} connect to other disciplines or areas of knowledge?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Connect,
            "Historical context",
            "Understand how this knowledge developed over time.",
            format!(
                "What's the history behind {}? How did our understanding evolve?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Challenge,
            "Test your understanding",
            "Put your knowledge to the test with a thought experiment.",
            format!(
                "Can you give me a challenging problem or thought experiment related to {}?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Challenge,
            "Common misconceptions",
            "Identify and correct common misunderstandings.",
            format!(
                "What are the most common misconceptions about {}, and why are they wrong?",
                name
            ),
        ),
        TopicSuggestion::new(
            SuggestionType::Apply,
            "Real-world applications",
            "See how this knowledge applies in practice.",
            format!("What are some practical, real-world applications of {}?", name),
        ),
        TopicSuggestion::new(
            SuggestionType::Apply,
            "Start a project",
            "Learn by doing with a hands-on project.",
            format!(
                "What's a good beginner project I could do to learn more about {}?",
                name
            ),
        ),
    ]
}

pub struct TopicSummaryGenerator {
    agent: Arc<dyn CompletionAgent>,
    prompts: Arc<PromptLibrary>,
}

impl TopicSummaryGenerator {
    pub fn new(agent: Arc<dyn CompletionAgent>, prompts: Arc<PromptLibrary>) -> Self {
        Self { agent, prompts }
    }

    /// Builds a knowledge graph over `concepts` and follow-up suggestions.
    ///
    /// `recent_messages` should be chronological; only the last
    /// [`MAX_EXCERPT_MESSAGES`] are quoted. Failures return the default
    /// suggestions, an empty graph and an error string.
    pub async fn generate(
        &self,
        topic: &Topic,
        concepts: &[Concept],
        recent_messages: &[Message],
    ) -> TopicSummaryResult {
        let concept_lines: Vec<String> = concepts
            .iter()
            .map(|c| format!("{} ({})", c.name, c.familiarity_level))
            .collect();
        let start = recent_messages.len().saturating_sub(MAX_EXCERPT_MESSAGES);
        let excerpts: Vec<String> = transcript(&recent_messages[start..], Speakers::Classroom)
            .into_iter()
            .map(|line| format!("{}: {}", line.speaker, truncate(&line.content, EXCERPT_CHARS)))
            .collect();

        let rendered = self.prompts.render(
            TOPIC_SUMMARY,
            context! {
                name => &topic.name,
                category => topic.category.as_deref().unwrap_or("General"),
                summary => topic.summary.as_deref().unwrap_or("No summary available yet"),
                concepts => concept_lines,
                excerpts => excerpts,
            },
        );
        let prompt = match rendered {
            Ok(prompt) => prompt,
            Err(e) => {
                tracing::warn!("Topic summary prompt failed: {}", e);
                return TopicSummaryResult::fallback(topic, SUMMARY_FAILED);
            }
        };

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(SUMMARY_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found {
            return TopicSummaryResult::fallback(topic, CLI_NOT_FOUND);
        }
        if response.is_failure() {
            let error = response.error.unwrap_or_else(|| SUMMARY_FAILED.to_string());
            return TopicSummaryResult::fallback(topic, error);
        }

        match parse_json_object::<SummaryReply>(&response.content) {
            Ok(reply) => TopicSummaryResult {
                knowledge_graph: reply
                    .knowledge_graph
                    .into_iter()
                    .map(|node| into_node(node, concepts, 1))
                    .collect(),
                follow_up_suggestions: reply
                    .follow_up_suggestions
                    .into_iter()
                    .map(|s| {
                        TopicSuggestion::new(s.suggestion_type, s.title, s.description, s.suggested_prompt)
                    })
                    .collect(),
                error: None,
            },
            Err(JsonExtractError::NoObject) => {
                TopicSummaryResult::fallback(topic, INVALID_RESPONSE_FORMAT)
            }
            Err(JsonExtractError::Malformed(e)) => {
                tracing::warn!("Malformed topic summary reply: {}", e);
                TopicSummaryResult::fallback(topic, SUMMARY_FAILED)
            }
        }
    }
}

/// Maps a reply node onto known concept ids; children below
/// [`MAX_GRAPH_DEPTH`] are dropped.
fn into_node(node: NodeReply, concepts: &[Concept], depth: usize) -> KnowledgeGraphNode {
    let concept_id = concepts
        .iter()
        .find(|c| c.name.eq_ignore_ascii_case(&node.concept_name))
        .map(|c| c.id.clone())
        .unwrap_or_else(trellis_core::generate_id);
    let children = if depth < MAX_GRAPH_DEPTH {
        node.children
            .into_iter()
            .map(|child| into_node(child, concepts, depth + 1))
            .collect()
    } else {
        Vec::new()
    };

    KnowledgeGraphNode {
        concept_id,
        concept_name: node.concept_name,
        familiarity_level: node.familiarity_level,
        children,
        related_concepts: node.related_concepts,
    }
}

fn truncate(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &content[..idx]),
        None => content.to_string(),
    }
}
