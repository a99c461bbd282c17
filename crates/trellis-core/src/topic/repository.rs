//! Topic repository trait.

use super::model::Topic;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for topic persistence.
///
/// Implementations are free to choose the storage format; referential
/// integrity with concepts and sessions is maintained by the caller.
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Finds a topic by its ID.
    ///
    /// - `Ok(Some(Topic))`: Topic found
    /// - `Ok(None)`: Topic not found
    async fn find_by_id(&self, topic_id: &str) -> Result<Option<Topic>>;

    /// Finds the first topic whose name matches case-insensitively.
    async fn find_by_name(&self, name: &str) -> Result<Option<Topic>>;

    /// Saves (inserts or replaces) a topic.
    async fn save(&self, topic: &Topic) -> Result<()>;

    /// Deletes a topic. Deleting a missing topic is not an error.
    async fn delete(&self, topic_id: &str) -> Result<()>;

    /// Lists all topics, most recently explored first.
    async fn list_all(&self) -> Result<Vec<Topic>>;

    /// Removes every topic.
    async fn clear(&self) -> Result<()>;
}
