//! Knowledge extraction from a finished conversation.

use super::digest::{Speakers, transcript};
use crate::json_extract::parse_json_object;
use crate::prompts::{KNOWLEDGE_EXTRACTION, PromptLibrary};
use minijinja::context;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use trellis_core::agent::{CompletionAgent, CompletionRequest};
use trellis_core::concept::{Concept, FamiliarityLevel};
use trellis_core::session::Message;
use trellis_core::topic::Topic;

const EXTRACTION_SYSTEM_PROMPT: &str =
    "You are a knowledge extraction assistant. Return only valid JSON.";

/// Fewest messages worth extracting from.
pub const MIN_MESSAGES_FOR_EXTRACTION: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedConcept {
    pub name: String,
    #[serde(default)]
    pub familiarity_level: FamiliarityLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_to: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedKnowledge {
    pub topic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_category: Option<String>,
    #[serde(default)]
    pub topic_summary: String,
    #[serde(default)]
    pub concepts: Vec<ExtractedConcept>,
}

impl ExtractedKnowledge {
    /// A new topic record for this extraction, linked to `session_id`.
    pub fn to_topic(&self, session_id: &str) -> Topic {
        let mut topic = Topic::new(self.topic_name.clone(), self.topic_category.clone());
        topic.session_ids.push(session_id.to_string());
        topic.summary = Some(self.topic_summary.clone());
        topic
    }

    /// Concept records for `topic_id`, deduplicated by case-insensitive name
    /// (first occurrence wins) and with `relatedTo` links resolved.
    pub fn to_concepts(&self, topic_id: &str, session_id: &str) -> Vec<Concept> {
        let mut seen = HashSet::new();
        let concepts: Vec<Concept> = self
            .concepts
            .iter()
            .filter(|c| !c.name.trim().is_empty() && seen.insert(c.name.to_lowercase()))
            .map(|c| Concept::new(c.name.clone(), topic_id, c.familiarity_level, session_id))
            .collect();
        self.link_related_concepts(concepts)
    }

    /// Resolves `relatedTo` names to ids of concepts in the same batch.
    ///
    /// Names outside the batch are dropped, as are self-links.
    pub fn link_related_concepts(&self, mut concepts: Vec<Concept>) -> Vec<Concept> {
        let name_to_id: HashMap<String, String> = concepts
            .iter()
            .map(|c| (c.name_key(), c.id.clone()))
            .collect();

        for concept in concepts.iter_mut() {
            let Some(related) = self
                .concepts
                .iter()
                .find(|extracted| extracted.name.to_lowercase() == concept.name_key())
                .and_then(|extracted| extracted.related_to.as_ref())
            else {
                continue;
            };

            let mut ids = Vec::new();
            for name in related {
                if let Some(id) = name_to_id.get(&name.to_lowercase()) {
                    if *id != concept.id && !ids.contains(id) {
                        ids.push(id.clone());
                    }
                }
            }
            concept.related_concept_ids = ids;
        }
        concepts
    }
}

pub struct KnowledgeExtractor {
    agent: Arc<dyn CompletionAgent>,
    prompts: Arc<PromptLibrary>,
}

impl KnowledgeExtractor {
    pub fn new(agent: Arc<dyn CompletionAgent>, prompts: Arc<PromptLibrary>) -> Self {
        Self { agent, prompts }
    }

    /// Extracts topic and concepts from a conversation.
    ///
    /// Returns `None` without calling the agent for fewer than two messages,
    /// and `None` on any agent or parse failure.
    pub async fn extract(&self, messages: &[Message]) -> Option<ExtractedKnowledge> {
        if messages.len() < MIN_MESSAGES_FOR_EXTRACTION {
            return None;
        }

        let lines = transcript(messages, Speakers::Classroom);
        let prompt = self
            .prompts
            .render(KNOWLEDGE_EXTRACTION, context! { lines => lines })
            .map_err(|e| tracing::warn!("Extraction prompt failed: {}", e))
            .ok()?;

        let response = self
            .agent
            .complete(CompletionRequest::new(prompt).with_system_prompt(EXTRACTION_SYSTEM_PROMPT))
            .await;
        if response.cli_not_found || response.error.is_some() {
            tracing::debug!("Extraction skipped: {:?}", response.error);
            return None;
        }

        let extracted: ExtractedKnowledge = parse_json_object(&response.content)
            .map_err(|e| tracing::warn!("Unusable extraction reply: {:?}", e))
            .ok()?;
        if extracted.topic_name.trim().is_empty() {
            return None;
        }
        Some(extracted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::test_support::ScriptedAgent;

    fn extraction(concepts: Vec<(&str, Vec<&str>)>) -> ExtractedKnowledge {
        ExtractedKnowledge {
            topic_name: "Rust Ownership".to_string(),
            topic_category: Some("Programming".to_string()),
            topic_summary: "Moves and borrows".to_string(),
            concepts: concepts
                .into_iter()
                .map(|(name, related)| ExtractedConcept {
                    name: name.to_string(),
                    familiarity_level: FamiliarityLevel::Explored,
                    related_to: Some(related.iter().map(|s| s.to_string()).collect()),
                })
                .collect(),
        }
    }

    #[test]
    fn test_to_topic_links_session() {
        let topic = extraction(vec![]).to_topic("s1");
        assert_eq!(topic.session_ids, vec!["s1".to_string()]);
        assert_eq!(topic.summary.as_deref(), Some("Moves and borrows"));
        assert!(topic.concept_ids.is_empty());
    }

    #[test]
    fn test_to_concepts_dedups_case_insensitively() {
        let concepts = extraction(vec![("Borrowing", vec![]), ("borrowing", vec![]), ("Moves", vec![])])
            .to_concepts("t1", "s1");
        let names: Vec<&str> = concepts.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Borrowing", "Moves"]);
        assert!(concepts.iter().all(|c| c.topic_id == "t1"));
        assert!(concepts.iter().all(|c| c.extracted_from_session_id == "s1"));
    }

    #[test]
    fn test_links_resolve_within_batch_only() {
        let concepts = extraction(vec![
            ("Borrowing", vec!["lifetimes", "Borrowing", "Traits"]),
            ("Lifetimes", vec!["BORROWING"]),
        ])
        .to_concepts("t1", "s1");

        let borrowing = &concepts[0];
        let lifetimes = &concepts[1];
        // "Traits" is not in the batch and the self-link is dropped
        assert_eq!(borrowing.related_concept_ids, vec![lifetimes.id.clone()]);
        assert_eq!(lifetimes.related_concept_ids, vec![borrowing.id.clone()]);
    }

    #[tokio::test]
    async fn test_extract_needs_two_messages() {
        let agent = Arc::new(ScriptedAgent::default());
        let extractor = KnowledgeExtractor::new(agent.clone(), Arc::new(PromptLibrary::new().unwrap()));

        assert!(extractor.extract(&[Message::user("s1", "hi")]).await.is_none());
        assert_eq!(agent.call_count(), 0);
    }

    #[tokio::test]
    async fn test_extract_parses_fenced_json() {
        let reply = r#"```json
{"topicName": "Calculus", "topicSummary": "Limits", "concepts": [{"name": "Limit", "familiarityLevel": "understood"}]}
```"#;
        let agent = Arc::new(ScriptedAgent::replying(reply));
        let extractor = KnowledgeExtractor::new(agent.clone(), Arc::new(PromptLibrary::new().unwrap()));

        let messages = vec![
            Message::user("s1", "What is a limit?"),
            Message::assistant("s1", "The value a function approaches."),
        ];
        let extracted = extractor.extract(&messages).await.unwrap();

        assert_eq!(extracted.topic_name, "Calculus");
        assert_eq!(extracted.concepts[0].familiarity_level, FamiliarityLevel::Understood);
        assert!(extracted.concepts[0].related_to.is_none());
        assert!(agent.requests()[0].prompt.contains(
            "Student: What is a limit?\n\nTeacher: The value a function approaches."
        ));
    }

    #[tokio::test]
    async fn test_extract_malformed_is_none() {
        let agent = Arc::new(ScriptedAgent::replying("Sorry, I can't help with that."));
        let extractor = KnowledgeExtractor::new(agent, Arc::new(PromptLibrary::new().unwrap()));
        let messages = vec![Message::user("s1", "a"), Message::assistant("s1", "b")];
        assert!(extractor.extract(&messages).await.is_none());
    }
}
