//! Per-topic summaries (knowledge graph plus follow-up suggestions),
//! cached in memory.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use trellis_core::agent::CompletionAgent;
use trellis_core::session::Message;
use trellis_core::Result;
use trellis_core::summary::TopicSummary;
use trellis_interaction::PromptLibrary;
use trellis_interaction::generation::topic_summary_generation::MAX_EXCERPT_MESSAGES;
use trellis_interaction::generation::{TopicSummaryGenerator, TopicSummaryResult};

use crate::background::BackgroundTasks;
use crate::context::Repositories;

pub const TOPIC_NOT_FOUND: &str = "Topic not found";

#[derive(Debug, Clone, Default)]
pub struct TopicSummaryState {
    pub summaries: HashMap<String, TopicSummary>,
    pub is_generating: bool,
    pub current_topic_id: Option<String>,
    pub error: Option<String>,
}

impl TopicSummaryState {
    /// Caches a successful result; an errored one only records the error.
    fn apply(&mut self, topic_id: &str, result: TopicSummaryResult) {
        if let Some(error) = result.error {
            self.error = Some(error);
            return;
        }
        let summary = TopicSummary::new(
            topic_id,
            result.knowledge_graph,
            result.follow_up_suggestions,
        );
        self.summaries.insert(topic_id.to_string(), summary);
        self.error = None;
    }
}

pub struct TopicSummaryStore {
    state: Arc<RwLock<TopicSummaryState>>,
    repositories: Repositories,
    generator: Arc<TopicSummaryGenerator>,
    background: Arc<BackgroundTasks>,
}

impl TopicSummaryStore {
    pub fn new(
        repositories: Repositories,
        agent: Arc<dyn CompletionAgent>,
        prompts: Arc<PromptLibrary>,
        background: Arc<BackgroundTasks>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(TopicSummaryState::default())),
            repositories,
            generator: Arc::new(TopicSummaryGenerator::new(agent, prompts)),
            background,
        }
    }

    pub async fn snapshot(&self) -> TopicSummaryState {
        self.state.read().await.clone()
    }

    /// Makes `topic_id` current, generating its summary if none is cached.
    pub async fn load_summary(&self, topic_id: &str) -> Result<()> {
        {
            let mut state = self.state.write().await;
            state.current_topic_id = Some(topic_id.to_string());
            if state.summaries.contains_key(topic_id) {
                return Ok(());
            }
        }
        self.regenerate_summary(topic_id).await
    }

    pub async fn regenerate_summary(&self, topic_id: &str) -> Result<()> {
        let token = self.background.begin(&target(topic_id));
        {
            let mut state = self.state.write().await;
            state.is_generating = true;
            state.error = None;
            state.current_topic_id = Some(topic_id.to_string());
        }

        let result = generate(&self.repositories, &self.generator, topic_id).await;

        let mut state = self.state.write().await;
        state.is_generating = false;
        match result {
            Ok(result) if !token.is_cancelled() => {
                state.apply(topic_id, result);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Regenerates silently. Errors and superseded runs leave the cache
    /// untouched.
    pub fn regenerate_summary_in_background(&self, topic_id: &str) -> JoinHandle<()> {
        let token = self.background.begin(&target(topic_id));
        let state = self.state.clone();
        let repositories = self.repositories.clone();
        let generator = self.generator.clone();
        let topic_id = topic_id.to_string();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => return,
                result = generate(&repositories, &generator, &topic_id) => result,
            };

            let mut state = state.write().await;
            if token.is_cancelled() {
                return;
            }
            match result {
                Ok(result) if result.error.is_none() => {
                    state.apply(&topic_id, result);
                }
                Ok(result) => {
                    tracing::debug!("Background summary for {} failed: {:?}", topic_id, result.error);
                }
                Err(e) => tracing::warn!("Background summary for {} failed: {}", topic_id, e),
            }
        })
    }

    pub async fn get_summary(&self, topic_id: &str) -> Option<TopicSummary> {
        self.state.read().await.summaries.get(topic_id).cloned()
    }

    pub async fn clear_summary(&self, topic_id: &str) {
        self.background.cancel(&target(topic_id));
        self.state.write().await.summaries.remove(topic_id);
    }

    pub async fn clear_all(&self) {
        let mut state = self.state.write().await;
        state.summaries.clear();
        state.current_topic_id = None;
        state.error = None;
    }
}

fn target(topic_id: &str) -> String {
    format!("summary:{}", topic_id)
}

async fn generate(
    repositories: &Repositories,
    generator: &TopicSummaryGenerator,
    topic_id: &str,
) -> Result<TopicSummaryResult> {
    let Some(topic) = repositories.topics.find_by_id(topic_id).await? else {
        return Ok(TopicSummaryResult {
            knowledge_graph: Vec::new(),
            follow_up_suggestions: Vec::new(),
            error: Some(TOPIC_NOT_FOUND.to_string()),
        });
    };
    let concepts = repositories.concepts.list_by_topic(topic_id).await?;
    let messages = recent_messages(repositories, topic_id).await?;
    Ok(generator.generate(&topic, &concepts, &messages).await)
}

/// The latest messages across the topic's sessions, in chronological order.
async fn recent_messages(repositories: &Repositories, topic_id: &str) -> Result<Vec<Message>> {
    let mut messages = Vec::new();
    for session in repositories.sessions.list_by_topic(topic_id).await? {
        messages.extend(repositories.messages.list_by_session(&session.id).await?);
    }
    messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
    let start = messages.len().saturating_sub(MAX_EXCERPT_MESSAGES);
    Ok(messages.split_off(start))
}
