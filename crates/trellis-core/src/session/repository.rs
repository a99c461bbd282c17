//! Session and message repository traits.

use super::message::Message;
use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session persistence.
///
/// This trait defines the contract for persisting and retrieving sessions,
/// decoupling the stores from the specific storage mechanism.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Saves a session to storage.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Deletes a session from storage (or does nothing if it doesn't exist).
    async fn delete(&self, session_id: &str) -> Result<()>;

    /// Lists the sessions tied to a topic, most recent message first.
    async fn list_by_topic(&self, topic_id: &str) -> Result<Vec<Session>>;

    /// Lists all stored sessions, most recent message first.
    async fn list_all(&self) -> Result<Vec<Session>>;

    async fn clear(&self) -> Result<()>;
}

/// An abstract repository for message persistence.
#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn find_by_id(&self, message_id: &str) -> Result<Option<Message>>;

    async fn save(&self, message: &Message) -> Result<()>;

    async fn delete(&self, message_id: &str) -> Result<()>;

    /// Lists the messages of a session in chronological order.
    async fn list_by_session(&self, session_id: &str) -> Result<Vec<Message>>;

    /// Deletes every message of a session.
    async fn delete_by_session(&self, session_id: &str) -> Result<()> {
        for message in self.list_by_session(session_id).await? {
            self.delete(&message.id).await?;
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Message>>;

    async fn clear(&self) -> Result<()>;
}
