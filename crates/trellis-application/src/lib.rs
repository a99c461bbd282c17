//! Application layer for Trellis.
//!
//! The stores in this crate hold the state the shell renders and coordinate
//! the storage repositories with the generation services.

pub mod background;
pub mod context;
pub mod dashboard_store;
pub mod data_transfer;
pub mod demo_service;
pub mod knowledge_store;
pub mod pending;
pub mod session_store;
pub mod settings_store;
pub mod topic_summary_store;

pub use background::BackgroundTasks;
pub use context::{AppContext, Repositories};
pub use dashboard_store::{DashboardState, DashboardStore};
pub use data_transfer::{DataTransfer, ExportData, default_export_file_name};
pub use demo_service::DemoService;
pub use knowledge_store::{KnowledgeState, KnowledgeStats, KnowledgeStore, TopicWithConcepts};
pub use pending::{PendingGuard, PendingTasks};
pub use session_store::{SessionState, SessionStore};
pub use settings_store::SettingsStore;
pub use topic_summary_store::{TopicSummaryState, TopicSummaryStore};
