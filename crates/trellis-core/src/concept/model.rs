//! Concept domain model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Coarse mastery indicator for a concept.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FamiliarityLevel {
    /// Briefly mentioned or just started
    #[default]
    Introduced,
    /// Discussed in some detail
    Explored,
    /// Thoroughly explained with examples
    Understood,
}

/// An atomic idea within a topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Concept {
    pub id: String,
    /// Unique within its topic by case-insensitive comparison
    pub name: String,
    pub topic_id: String,
    /// Cross-references resolved at extraction time
    #[serde(default)]
    pub related_concept_ids: Vec<String>,
    pub familiarity_level: FamiliarityLevel,
    pub extracted_from_session_id: String,
}

impl Concept {
    pub fn new(
        name: impl Into<String>,
        topic_id: impl Into<String>,
        familiarity_level: FamiliarityLevel,
        session_id: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::generate_id(),
            name: name.into(),
            topic_id: topic_id.into(),
            related_concept_ids: Vec::new(),
            familiarity_level,
            extracted_from_session_id: session_id.into(),
        }
    }

    /// Lowercased name used as the deduplication key.
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}
