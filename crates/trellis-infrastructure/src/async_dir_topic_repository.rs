//! DirStorage-based TopicRepository implementation

use crate::paths::{Table, TrellisPaths};
use crate::storage::DirStorage;
use crate::storage_repository::StorageRepository;
use async_trait::async_trait;
use trellis_core::{
    error::{Result, TrellisError},
    repository::TopicRepository,
    topic::Topic,
};

/// Directory structure:
/// ```text
/// data_dir/
/// └── topics/
///     ├── topic-uuid-1.toml
///     └── topic-uuid-2.toml
/// ```
pub struct AsyncDirTopicRepository {
    storage: DirStorage,
}

impl StorageRepository for AsyncDirTopicRepository {
    const TABLE: Table = Table::Topics;
    const ENTITY_NAME: &'static str = "topic";
    fn storage(&self) -> &DirStorage {
        &self.storage
    }
}

impl AsyncDirTopicRepository {
    pub async fn new(paths: &TrellisPaths) -> Result<Self> {
        let storage = DirStorage::open(paths.table_dir(Self::TABLE)).await?;
        Ok(Self { storage })
    }
}

#[async_trait]
impl TopicRepository for AsyncDirTopicRepository {
    async fn find_by_id(&self, topic_id: &str) -> Result<Option<Topic>> {
        self.storage.load(topic_id).await
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Topic>> {
        let topics = self.list_all().await?;
        Ok(topics.into_iter().find(|topic| topic.has_name(name)))
    }

    async fn save(&self, topic: &Topic) -> Result<()> {
        self.storage.save(&topic.id, topic).await.map_err(|e| {
            TrellisError::data_access(format!("Failed to save {}: {}", Self::ENTITY_NAME, e))
        })
    }

    async fn delete(&self, topic_id: &str) -> Result<()> {
        self.storage.delete(topic_id).await
    }

    async fn list_all(&self) -> Result<Vec<Topic>> {
        let mut topics: Vec<Topic> = self
            .storage
            .load_all::<Topic>()
            .await?
            .into_iter()
            .map(|(_, topic)| topic)
            .collect();

        // Most recently explored first
        topics.sort_by(|a, b| b.last_explored_at.cmp(&a.last_explored_at));
        Ok(topics)
    }

    async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }
}
