//! Composition root: repositories, generation services and stores wired
//! together for the shell.

use std::sync::Arc;
use trellis_core::Result;
use trellis_core::agent::CompletionAgent;
use trellis_core::repository::{
    ConceptRepository, MessageRepository, SessionRepository, SettingsRepository, TopicRepository,
};
use trellis_infrastructure::{
    AsyncDirConceptRepository, AsyncDirMessageRepository, AsyncDirSessionRepository,
    AsyncDirTopicRepository, TomlSettingsRepository, TrellisPaths,
};
use trellis_interaction::PromptLibrary;

use crate::background::BackgroundTasks;
use crate::dashboard_store::DashboardStore;
use crate::data_transfer::{DataTransfer, ExportData};
use crate::demo_service::DemoService;
use crate::knowledge_store::KnowledgeStore;
use crate::pending::PendingTasks;
use crate::session_store::SessionStore;
use crate::settings_store::SettingsStore;
use crate::topic_summary_store::TopicSummaryStore;

/// Every record table behind its repository trait.
#[derive(Clone)]
pub struct Repositories {
    pub topics: Arc<dyn TopicRepository>,
    pub concepts: Arc<dyn ConceptRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    /// Directory-backed repositories under the data directory.
    pub async fn open(paths: &TrellisPaths) -> Result<Self> {
        Ok(Self {
            topics: Arc::new(AsyncDirTopicRepository::new(paths).await?),
            concepts: Arc::new(AsyncDirConceptRepository::new(paths).await?),
            sessions: Arc::new(AsyncDirSessionRepository::new(paths).await?),
            messages: Arc::new(AsyncDirMessageRepository::new(paths).await?),
            settings: Arc::new(TomlSettingsRepository::new(paths)),
        })
    }
}

/// All application stores, shared with the shell.
pub struct AppContext {
    pub paths: TrellisPaths,
    pub repositories: Repositories,
    pub pending: PendingTasks,
    pub background: Arc<BackgroundTasks>,
    pub settings: Arc<SettingsStore>,
    pub knowledge: Arc<KnowledgeStore>,
    pub sessions: Arc<SessionStore>,
    pub dashboard: Arc<DashboardStore>,
    pub summaries: Arc<TopicSummaryStore>,
    pub demos: DemoService,
    pub data_transfer: DataTransfer,
}

impl AppContext {
    pub async fn open(paths: TrellisPaths, agent: Arc<dyn CompletionAgent>) -> Result<Self> {
        let repositories = Repositories::open(&paths).await?;
        Self::with_repositories(paths, repositories, agent)
    }

    pub fn with_repositories(
        paths: TrellisPaths,
        repositories: Repositories,
        agent: Arc<dyn CompletionAgent>,
    ) -> Result<Self> {
        let prompts = Arc::new(PromptLibrary::new()?);
        let pending = PendingTasks::new();
        let background = Arc::new(BackgroundTasks::new());

        let settings = Arc::new(SettingsStore::new(repositories.settings.clone()));
        let knowledge = Arc::new(KnowledgeStore::new(
            repositories.clone(),
            agent.clone(),
            prompts.clone(),
        ));
        let sessions = Arc::new(SessionStore::new(
            repositories.clone(),
            agent.clone(),
            prompts.clone(),
            knowledge.clone(),
            settings.clone(),
            pending.clone(),
        ));
        let dashboard = Arc::new(DashboardStore::new(
            repositories.clone(),
            agent.clone(),
            prompts.clone(),
            background.clone(),
        ));
        let summaries = Arc::new(TopicSummaryStore::new(
            repositories.clone(),
            agent.clone(),
            prompts.clone(),
            background.clone(),
        ));
        let demos = DemoService::new(agent, prompts, paths.demos_dir());
        let data_transfer = DataTransfer::new(repositories.clone());

        Ok(Self {
            paths,
            repositories,
            pending,
            background,
            settings,
            knowledge,
            sessions,
            dashboard,
            summaries,
            demos,
            data_transfer,
        })
    }

    /// Loads settings and knowledge for the first screen.
    pub async fn initialize(&self) -> Result<()> {
        self.settings.load_settings().await?;
        self.knowledge.load_knowledge().await?;
        self.sessions.load_topics().await?;
        Ok(())
    }

    /// Imports a backup and reloads every store from storage.
    pub async fn import_from_file(&self, path: &std::path::Path) -> Result<ExportData> {
        let data = self.data_transfer.import_from_file(path).await?;
        self.settings.invalidate().await;
        self.reload().await?;
        Ok(data)
    }

    /// Clears all knowledge and the in-memory views derived from it.
    pub async fn clear_all_knowledge(&self) -> Result<()> {
        self.knowledge.clear_all_knowledge().await?;
        self.reload().await
    }

    async fn reload(&self) -> Result<()> {
        self.background.cancel_all();
        self.settings.load_settings().await?;
        self.knowledge.load_knowledge().await?;
        self.sessions.load_topics().await?;
        self.summaries.clear_all().await;
        self.dashboard.invalidate().await;
        Ok(())
    }

    /// Cancels background refreshes and waits for sends and extractions
    /// to finish.
    pub async fn shutdown(&self) {
        self.background.cancel_all();
        if self.pending.has_pending_tasks() {
            tracing::info!(
                "Waiting for {} pending tasks before exit",
                self.pending.active_count()
            );
        }
        self.pending.wait_until_idle().await;
    }
}
