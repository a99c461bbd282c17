//! DirStorage-based MessageRepository implementation

use crate::paths::{Table, TrellisPaths};
use crate::storage::DirStorage;
use crate::storage_repository::StorageRepository;
use async_trait::async_trait;
use trellis_core::{
    error::{Result, TrellisError},
    repository::MessageRepository,
    session::Message,
};

pub struct AsyncDirMessageRepository {
    storage: DirStorage,
}

impl StorageRepository for AsyncDirMessageRepository {
    const TABLE: Table = Table::Messages;
    const ENTITY_NAME: &'static str = "message";
    fn storage(&self) -> &DirStorage {
        &self.storage
    }
}

impl AsyncDirMessageRepository {
    pub async fn new(paths: &TrellisPaths) -> Result<Self> {
        let storage = DirStorage::open(paths.table_dir(Self::TABLE)).await?;
        Ok(Self { storage })
    }
}

#[async_trait]
impl MessageRepository for AsyncDirMessageRepository {
    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>> {
        self.storage.load(message_id).await
    }

    async fn save(&self, message: &Message) -> Result<()> {
        self.storage.save(&message.id, message).await.map_err(|e| {
            TrellisError::data_access(format!("Failed to save {}: {}", Self::ENTITY_NAME, e))
        })
    }

    async fn delete(&self, message_id: &str) -> Result<()> {
        self.storage.delete(message_id).await
    }

    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Message>> {
        let messages = self.list_all().await?;
        Ok(messages
            .into_iter()
            .filter(|message| message.session_id == session_id)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Message>> {
        let mut messages: Vec<Message> = self
            .storage
            .load_all::<Message>()
            .await?
            .into_iter()
            .map(|(_, message)| message)
            .collect();

        // Chronological
        messages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        Ok(messages)
    }

    async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }
}
