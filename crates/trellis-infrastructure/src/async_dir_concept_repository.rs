//! DirStorage-based ConceptRepository implementation

use crate::paths::{Table, TrellisPaths};
use crate::storage::DirStorage;
use crate::storage_repository::StorageRepository;
use async_trait::async_trait;
use trellis_core::{
    concept::Concept,
    error::{Result, TrellisError},
    repository::ConceptRepository,
};

pub struct AsyncDirConceptRepository {
    storage: DirStorage,
}

impl StorageRepository for AsyncDirConceptRepository {
    const TABLE: Table = Table::Concepts;
    const ENTITY_NAME: &'static str = "concept";
    fn storage(&self) -> &DirStorage {
        &self.storage
    }
}

impl AsyncDirConceptRepository {
    pub async fn new(paths: &TrellisPaths) -> Result<Self> {
        let storage = DirStorage::open(paths.table_dir(Self::TABLE)).await?;
        Ok(Self { storage })
    }
}

#[async_trait]
impl ConceptRepository for AsyncDirConceptRepository {
    async fn find_by_id(&self, concept_id: &str) -> Result<Option<Concept>> {
        self.storage.load(concept_id).await
    }

    async fn save(&self, concept: &Concept) -> Result<()> {
        self.storage.save(&concept.id, concept).await.map_err(|e| {
            TrellisError::data_access(format!("Failed to save {}: {}", Self::ENTITY_NAME, e))
        })
    }

    async fn delete(&self, concept_id: &str) -> Result<()> {
        self.storage.delete(concept_id).await
    }

    async fn list_by_topic(&self, topic_id: &str) -> Result<Vec<Concept>> {
        let concepts = self.list_all().await?;
        Ok(concepts
            .into_iter()
            .filter(|concept| concept.topic_id == topic_id)
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Concept>> {
        let mut concepts: Vec<Concept> = self
            .storage
            .load_all::<Concept>()
            .await?
            .into_iter()
            .map(|(_, concept)| concept)
            .collect();
        concepts.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(concepts)
    }

    async fn clear(&self) -> Result<()> {
        self.storage.clear().await
    }
}
