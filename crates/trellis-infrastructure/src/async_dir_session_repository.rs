//! DirStorage-based SessionRepository implementation

use crate::paths::{Table, TrellisPaths};
use crate::storage::DirStorage;
use crate::storage_repository::StorageRepository;
use async_trait::async_trait;
use trellis_core::{
    error::{Result, TrellisError},
    repository::SessionRepository,
    session::Session,
};

pub struct AsyncDirSessionRepository {
    storage: DirStorage,
}

impl StorageRepository for AsyncDirSessionRepository {
    const TABLE: Table = Table::Sessions;
    const ENTITY_NAME: &'static str = "session";
    fn storage(&self) -> &DirStorage {
        &self.storage
    }
}

impl AsyncDirSessionRepository {
    pub async fn new(paths: &TrellisPaths) -> Result<Self> {
        let storage = DirStorage::open(paths.table_dir(Self::TABLE)).await?;
        Ok(Self { storage })
    }
}

#[async_trait]
impl SessionRepository for AsyncDirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        self.storage.load(session_id).await
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.storage.save(&session.id, session).await.map_err(|e| {
            TrellisError::data_access(format!("Failed to save {}: {}", Self::ENTITY_NAME, e))
        })
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        self.storage.delete(session_id).await
    }

    async fn list_by_topic(&self, topic_id: &str) -> Result<Vec<Session>> {
        let sessions = self.list_all().await?;
        Ok(sessions
            .into_iter()
            .filter(|session| session.topic_id.as_deref() == Some(topic_id))
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let mut sessions: Vec<Session> = self
            .storage
            .load_all::<Session>()
            .await?
            .into_iter()
            .map(|(_, session)| session)
            .collect();

        sessions.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(sessions)
    }

    async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    async fn create_test_repository() -> (AsyncDirSessionRepository, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let paths = TrellisPaths::new(Some(temp_dir.path())).unwrap();
        let repo = AsyncDirSessionRepository::new(&paths).await.unwrap();
        (repo, temp_dir)
    }

    #[tokio::test]
    async fn test_list_by_topic_newest_first() {
        let (repo, _temp_dir) = create_test_repository().await;

        let mut first = Session::new(Some("t1".to_string()));
        first.last_message_at = Utc::now() - Duration::hours(3);
        let second = Session::new(Some("t1".to_string()));
        let unrelated = Session::new(None);
        for session in [&first, &second, &unrelated] {
            repo.save(session).await.unwrap();
        }

        let sessions = repo.list_by_topic("t1").await.unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].id, second.id);
        assert_eq!(sessions[1].id, first.id);
    }

    #[tokio::test]
    async fn test_untopiced_session_round_trip() {
        let (repo, _temp_dir) = create_test_repository().await;
        let session = Session::new(None);
        repo.save(&session).await.unwrap();

        let found = repo.find_by_id(&session.id).await.unwrap().unwrap();
        assert!(found.topic_id.is_none());
        assert_eq!(found.started_at, session.started_at);
    }
}
