//! Topics and concepts: extraction, merging and queries.
//!
//! Extraction results are merged by topic name (case-insensitive). An
//! existing topic keeps its id and gains only concepts it has not seen; a
//! new name creates a topic with the whole deduplicated batch. Agent
//! failures leave storage untouched.

use chrono::Utc;
use minijinja::context;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use trellis_core::agent::CompletionAgent;
use trellis_core::concept::{Concept, FamiliarityLevel};
use trellis_core::session::Message;
use trellis_core::topic::Topic;
use trellis_core::{Result, TrellisError};
use trellis_interaction::PromptLibrary;
use trellis_interaction::generation::digest::topic_digest;
use trellis_interaction::generation::{ExtractedKnowledge, KnowledgeExtractor};
use trellis_interaction::prompts::KNOWLEDGE_CONTEXT;

use crate::context::Repositories;
use crate::pending::PendingTasks;

/// Topics included in the chat knowledge context.
pub const KNOWLEDGE_CONTEXT_TOPICS: usize = 10;

#[derive(Debug, Clone, Default)]
pub struct KnowledgeState {
    /// Most recently explored first
    pub topics: Vec<Topic>,
    pub concepts: Vec<Concept>,
    /// At least one extraction is running
    pub is_extracting: bool,
    pub last_extraction: Option<ExtractedKnowledge>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopicWithConcepts {
    pub topic: Topic,
    pub concepts: Vec<Concept>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeStats {
    pub topic_count: usize,
    pub session_count: usize,
    pub concept_count: usize,
    pub introduced: usize,
    pub explored: usize,
    pub understood: usize,
}

pub struct KnowledgeStore {
    state: RwLock<KnowledgeState>,
    repositories: Repositories,
    extractor: KnowledgeExtractor,
    prompts: Arc<PromptLibrary>,
    extractions: PendingTasks,
}

impl KnowledgeStore {
    pub fn new(
        repositories: Repositories,
        agent: Arc<dyn CompletionAgent>,
        prompts: Arc<PromptLibrary>,
    ) -> Self {
        Self {
            state: RwLock::new(KnowledgeState::default()),
            repositories,
            extractor: KnowledgeExtractor::new(agent, prompts.clone()),
            prompts,
            extractions: PendingTasks::new(),
        }
    }

    pub async fn snapshot(&self) -> KnowledgeState {
        let mut state = self.state.read().await.clone();
        state.is_extracting = self.extractions.has_pending_tasks();
        state
    }

    pub async fn is_extracting(&self) -> bool {
        self.extractions.has_pending_tasks()
    }

    pub async fn load_knowledge(&self) -> Result<()> {
        let topics = self.repositories.topics.list_all().await?;
        let concepts = self.repositories.concepts.list_all().await?;
        let mut state = self.state.write().await;
        state.topics = topics;
        state.concepts = concepts;
        Ok(())
    }

    /// Extracts knowledge from a finished session and merges it by topic
    /// name. Returns the created or updated topic, or `None` when nothing
    /// was extracted.
    pub async fn extract_and_save_knowledge(
        &self,
        messages: &[Message],
        session_id: &str,
    ) -> Result<Option<Topic>> {
        let _extracting = self.extractions.register();
        self.extract_and_merge(messages, session_id).await
    }

    /// Extracts knowledge from a session already tied to `topic_id` and
    /// merges it into that topic. A missing topic is a no-op.
    pub async fn update_topic_from_session(
        &self,
        topic_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<Option<Topic>> {
        let _extracting = self.extractions.register();
        self.extract_into(topic_id, session_id, messages).await
    }

    async fn extract_and_merge(
        &self,
        messages: &[Message],
        session_id: &str,
    ) -> Result<Option<Topic>> {
        let Some(extraction) = self.extract(messages).await else {
            return Ok(None);
        };

        let topic = match self
            .repositories
            .topics
            .find_by_name(&extraction.topic_name)
            .await?
        {
            Some(existing) => {
                tracing::info!("Merging session {} into topic '{}'", session_id, existing.name);
                self.merge_into_topic(existing, &extraction, session_id)
                    .await?
            }
            None => {
                let mut topic = extraction.to_topic(session_id);
                let concepts = extraction.to_concepts(&topic.id, session_id);
                let concept_ids: Vec<String> = concepts.iter().map(|c| c.id.clone()).collect();
                topic.concept_ids = concept_ids.clone();

                self.repositories.topics.save(&topic).await?;
                self.repositories.concepts.save_all(&concepts).await?;
                self.record_on_session(session_id, &topic.id, &concept_ids)
                    .await?;
                tracing::info!(
                    "Created topic '{}' with {} concepts",
                    topic.name,
                    concept_ids.len()
                );
                topic
            }
        };

        self.load_knowledge().await?;
        Ok(Some(topic))
    }

    async fn extract_into(
        &self,
        topic_id: &str,
        session_id: &str,
        messages: &[Message],
    ) -> Result<Option<Topic>> {
        let Some(extraction) = self.extract(messages).await else {
            return Ok(None);
        };
        let Some(topic) = self.repositories.topics.find_by_id(topic_id).await? else {
            tracing::debug!("Topic {} disappeared before extraction finished", topic_id);
            return Ok(None);
        };

        let topic = self
            .merge_into_topic(topic, &extraction, session_id)
            .await?;
        self.load_knowledge().await?;
        Ok(Some(topic))
    }

    async fn extract(&self, messages: &[Message]) -> Option<ExtractedKnowledge> {
        let extraction = self.extractor.extract(messages).await?;
        self.state.write().await.last_extraction = Some(extraction.clone());
        Some(extraction)
    }

    async fn merge_into_topic(
        &self,
        mut topic: Topic,
        extraction: &ExtractedKnowledge,
        session_id: &str,
    ) -> Result<Topic> {
        topic.last_explored_at = Utc::now();
        topic.link_session(session_id);
        topic.summary = Some(extraction.topic_summary.clone());

        let known: HashSet<String> = self
            .repositories
            .concepts
            .list_by_topic(&topic.id)
            .await?
            .iter()
            .map(Concept::name_key)
            .collect();
        let mut fresh: Vec<Concept> = extraction
            .to_concepts(&topic.id, session_id)
            .into_iter()
            .filter(|concept| !known.contains(&concept.name_key()))
            .collect();

        // Links may only point at concepts that are actually saved.
        let fresh_ids: HashSet<String> = fresh.iter().map(|c| c.id.clone()).collect();
        for concept in fresh.iter_mut() {
            concept.related_concept_ids.retain(|id| fresh_ids.contains(id));
        }

        let concept_ids: Vec<String> = fresh.iter().map(|c| c.id.clone()).collect();
        self.repositories.concepts.save_all(&fresh).await?;
        topic.concept_ids.extend(concept_ids.iter().cloned());
        self.repositories.topics.save(&topic).await?;
        self.record_on_session(session_id, &topic.id, &concept_ids)
            .await?;

        Ok(topic)
    }

    /// Ties the session to its topic (only if unset) and records the
    /// concept ids it contributed.
    async fn record_on_session(
        &self,
        session_id: &str,
        topic_id: &str,
        concept_ids: &[String],
    ) -> Result<()> {
        let Some(mut session) = self.repositories.sessions.find_by_id(session_id).await? else {
            tracing::debug!("Session {} is not persisted; skipping link", session_id);
            return Ok(());
        };

        let mut changed = session.assign_topic(topic_id);
        for id in concept_ids {
            if !session.extracted_concept_ids.contains(id) {
                session.extracted_concept_ids.push(id.clone());
                changed = true;
            }
        }
        if changed {
            self.repositories.sessions.save(&session).await?;
        }
        Ok(())
    }

    pub async fn get_topic_with_concepts(&self, topic_id: &str) -> Result<Option<TopicWithConcepts>> {
        let Some(topic) = self.repositories.topics.find_by_id(topic_id).await? else {
            return Ok(None);
        };
        let concepts = self.repositories.concepts.list_by_topic(topic_id).await?;
        Ok(Some(TopicWithConcepts { topic, concepts }))
    }

    /// Topics owning concepts that this topic's concepts link to.
    pub async fn get_related_topics(&self, topic_id: &str) -> Result<Vec<Topic>> {
        let Some(data) = self.get_topic_with_concepts(topic_id).await? else {
            return Ok(Vec::new());
        };

        let mut seen = HashSet::new();
        let related_ids: Vec<&String> = data
            .concepts
            .iter()
            .flat_map(|c| c.related_concept_ids.iter())
            .filter(|id| seen.insert(*id))
            .collect();

        let mut topic_ids: Vec<String> = Vec::new();
        for id in related_ids {
            if let Some(concept) = self.repositories.concepts.find_by_id(id).await? {
                if concept.topic_id != topic_id && !topic_ids.contains(&concept.topic_id) {
                    topic_ids.push(concept.topic_id);
                }
            }
        }

        let mut topics = Vec::with_capacity(topic_ids.len());
        for id in &topic_ids {
            if let Some(topic) = self.repositories.topics.find_by_id(id).await? {
                topics.push(topic);
            }
        }
        Ok(topics)
    }

    /// Prior-knowledge text block for the chat system prompt; empty when
    /// nothing has been learned yet.
    pub async fn get_knowledge_context(&self) -> Result<String> {
        let topics = self.repositories.topics.list_all().await?;
        if topics.is_empty() {
            return Ok(String::new());
        }

        let concepts = self.repositories.concepts.list_all().await?;
        let digests: Vec<_> = topics
            .iter()
            .take(KNOWLEDGE_CONTEXT_TOPICS)
            .map(|topic| topic_digest(topic, &concepts))
            .collect();
        self.prompts
            .render(KNOWLEDGE_CONTEXT, context! { topics => digests })
    }

    /// Creates a topic explicitly. An existing topic with the same name
    /// (case-insensitive) is returned instead.
    pub async fn create_topic(&self, name: &str, category: Option<String>) -> Result<Topic> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TrellisError::internal("Topic name cannot be empty"));
        }
        if let Some(existing) = self.repositories.topics.find_by_name(name).await? {
            return Ok(existing);
        }

        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        let topic = Topic::new(name, category);
        self.repositories.topics.save(&topic).await?;
        self.load_knowledge().await?;
        Ok(topic)
    }

    /// Deletes a topic with its sessions, their messages and its concepts.
    pub async fn delete_topic(&self, topic_id: &str) -> Result<()> {
        let topic = self.repositories.topics.find_by_id(topic_id).await?;

        let mut session_ids: Vec<String> = self
            .repositories
            .sessions
            .list_by_topic(topic_id)
            .await?
            .into_iter()
            .map(|s| s.id)
            .collect();
        if let Some(topic) = &topic {
            for id in &topic.session_ids {
                if !session_ids.contains(id) {
                    session_ids.push(id.clone());
                }
            }
        }

        for session_id in &session_ids {
            self.repositories.messages.delete_by_session(session_id).await?;
            self.repositories.sessions.delete(session_id).await?;
        }
        for concept in self.repositories.concepts.list_by_topic(topic_id).await? {
            self.repositories.concepts.delete(&concept.id).await?;
        }
        self.repositories.topics.delete(topic_id).await?;

        tracing::info!(
            "Deleted topic {} with {} sessions",
            topic_id,
            session_ids.len()
        );
        self.load_knowledge().await
    }

    /// Removes every topic, concept, session and message. Settings stay.
    pub async fn clear_all_knowledge(&self) -> Result<()> {
        self.repositories.messages.clear().await?;
        self.repositories.sessions.clear().await?;
        self.repositories.concepts.clear().await?;
        self.repositories.topics.clear().await?;

        let mut state = self.state.write().await;
        state.topics.clear();
        state.concepts.clear();
        state.last_extraction = None;
        tracing::info!("Cleared all knowledge data");
        Ok(())
    }

    pub async fn knowledge_stats(&self) -> Result<KnowledgeStats> {
        let topics = self.repositories.topics.list_all().await?;
        let sessions = self.repositories.sessions.list_all().await?;
        let concepts = self.repositories.concepts.list_all().await?;

        let count = |level: FamiliarityLevel| {
            concepts
                .iter()
                .filter(|c| c.familiarity_level == level)
                .count()
        };
        Ok(KnowledgeStats {
            topic_count: topics.len(),
            session_count: sessions.len(),
            concept_count: concepts.len(),
            introduced: count(FamiliarityLevel::Introduced),
            explored: count(FamiliarityLevel::Explored),
            understood: count(FamiliarityLevel::Understood),
        })
    }
}
