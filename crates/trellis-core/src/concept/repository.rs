//! Concept repository trait.

use super::model::Concept;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for concept persistence.
#[async_trait]
pub trait ConceptRepository: Send + Sync {
    async fn find_by_id(&self, concept_id: &str) -> Result<Option<Concept>>;

    /// Saves (inserts or replaces) a concept.
    async fn save(&self, concept: &Concept) -> Result<()>;

    /// Saves a batch of concepts. Not atomic across the batch.
    async fn save_all(&self, concepts: &[Concept]) -> Result<()> {
        for concept in concepts {
            self.save(concept).await?;
        }
        Ok(())
    }

    async fn delete(&self, concept_id: &str) -> Result<()>;

    /// Lists the concepts owned by a topic.
    async fn list_by_topic(&self, topic_id: &str) -> Result<Vec<Concept>>;

    async fn list_all(&self) -> Result<Vec<Concept>>;

    async fn clear(&self) -> Result<()>;
}
