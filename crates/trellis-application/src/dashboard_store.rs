//! Dashboard feed state.

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trellis_core::Result;
use trellis_core::agent::CompletionAgent;
use trellis_core::feed::DashboardCard;
use trellis_interaction::PromptLibrary;
use trellis_interaction::generation::feed_generation::MAX_HISTORY_TOPICS;
use trellis_interaction::generation::{FeedGenerator, FeedResult};

use crate::background::BackgroundTasks;
use crate::context::Repositories;

const FEED_TARGET: &str = "feed";

/// Cards younger than this are reused by `load_feed`.
pub const FEED_STALE_AFTER_MINUTES: i64 = 5;

#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub cards: Vec<DashboardCard>,
    pub is_loading: bool,
    pub error: Option<String>,
    pub last_generated: Option<DateTime<Utc>>,
}

impl DashboardState {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        match self.last_generated {
            Some(generated) if !self.cards.is_empty() => {
                now - generated < Duration::minutes(FEED_STALE_AFTER_MINUTES)
            }
            _ => false,
        }
    }

    fn apply(&mut self, result: FeedResult) {
        self.cards = result.cards;
        self.error = result.error;
        self.last_generated = Some(Utc::now());
    }
}

pub struct DashboardStore {
    state: Arc<RwLock<DashboardState>>,
    repositories: Repositories,
    generator: Arc<FeedGenerator>,
    background: Arc<BackgroundTasks>,
}

impl DashboardStore {
    pub fn new(
        repositories: Repositories,
        agent: Arc<dyn CompletionAgent>,
        prompts: Arc<PromptLibrary>,
        background: Arc<BackgroundTasks>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(DashboardState::default())),
            repositories,
            generator: Arc::new(FeedGenerator::new(agent, prompts)),
            background,
        }
    }

    pub async fn snapshot(&self) -> DashboardState {
        self.state.read().await.clone()
    }

    /// Forces the next `load_feed` to regenerate.
    pub async fn invalidate(&self) {
        self.state.write().await.last_generated = None;
    }

    /// Generates the feed unless recent cards are already loaded.
    pub async fn load_feed(&self) -> Result<()> {
        if self.state.read().await.is_fresh(Utc::now()) {
            return Ok(());
        }
        self.refresh_feed().await
    }

    /// Regenerates the feed with the loading flag set.
    pub async fn refresh_feed(&self) -> Result<()> {
        let token = self.background.begin(FEED_TARGET);
        {
            let mut state = self.state.write().await;
            state.is_loading = true;
            state.error = None;
        }

        let result = generate(&self.repositories, &self.generator).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(result) if !token.is_cancelled() => {
                state.apply(result);
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => {
                state.error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Regenerates the feed without touching the loading flag.
    ///
    /// A later refresh supersedes this one; a superseded refresh never
    /// writes its result.
    pub fn refresh_feed_in_background(&self) -> JoinHandle<()> {
        let token = self.background.begin(FEED_TARGET);
        let state = self.state.clone();
        let repositories = self.repositories.clone();
        let generator = self.generator.clone();

        tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!("Background feed refresh superseded");
                    return;
                }
                result = generate(&repositories, &generator) => result,
            };
            apply_unless_cancelled(&state, &token, result).await;
        })
    }
}

async fn apply_unless_cancelled(
    state: &RwLock<DashboardState>,
    token: &CancellationToken,
    result: Result<FeedResult>,
) {
    let mut state = state.write().await;
    if token.is_cancelled() {
        return;
    }
    match result {
        Ok(result) => state.apply(result),
        Err(e) => tracing::warn!("Background feed refresh failed: {}", e),
    }
}

async fn generate(repositories: &Repositories, generator: &FeedGenerator) -> Result<FeedResult> {
    let mut topics = repositories.topics.list_all().await?;
    topics.truncate(MAX_HISTORY_TOPICS);
    let concepts = repositories.concepts.list_all().await?;
    Ok(generator.generate_feed(&topics, &concepts).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freshness_window() {
        let now = Utc::now();
        let mut state = DashboardState::default();
        assert!(!state.is_fresh(now));

        state.last_generated = Some(now - Duration::minutes(2));
        assert!(!state.is_fresh(now), "no cards means nothing to reuse");

        state.cards = trellis_interaction::generation::default_cards();
        assert!(state.is_fresh(now));

        state.last_generated = Some(now - Duration::minutes(FEED_STALE_AFTER_MINUTES + 1));
        assert!(!state.is_fresh(now));
    }
}
