pub mod async_dir_concept_repository;
pub mod async_dir_message_repository;
pub mod async_dir_session_repository;
pub mod async_dir_topic_repository;
pub mod config_service;
pub mod paths;
pub mod storage;
pub mod storage_repository;
pub mod toml_settings_repository;

pub use crate::async_dir_concept_repository::AsyncDirConceptRepository;
pub use crate::async_dir_message_repository::AsyncDirMessageRepository;
pub use crate::async_dir_session_repository::AsyncDirSessionRepository;
pub use crate::async_dir_topic_repository::AsyncDirTopicRepository;
pub use crate::config_service::ConfigService;
pub use crate::paths::TrellisPaths;
pub use crate::toml_settings_repository::TomlSettingsRepository;
