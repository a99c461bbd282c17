//! Topic domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named subject area grouping learning sessions and concepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Unique topic identifier (UUID format)
    pub id: String,
    /// Display name, unique by case-insensitive comparison
    pub name: String,
    /// Optional broad category (e.g. "Mathematics")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Concepts owned by this topic
    #[serde(default)]
    pub concept_ids: Vec<String>,
    /// Sessions tied to this topic
    #[serde(default)]
    pub session_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_explored_at: DateTime<Utc>,
    /// Free-text summary of what was learned, replaced on each extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl Topic {
    /// Creates a fresh topic with no concepts or sessions.
    pub fn new(name: impl Into<String>, category: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::generate_id(),
            name: name.into(),
            category,
            concept_ids: Vec::new(),
            session_ids: Vec::new(),
            created_at: now,
            last_explored_at: now,
            summary: None,
        }
    }

    /// Case-insensitive name comparison used for deduplication.
    pub fn has_name(&self, name: &str) -> bool {
        self.name.to_lowercase() == name.to_lowercase()
    }

    /// Appends a session id unless it is already linked.
    ///
    /// Returns `true` when the list changed.
    pub fn link_session(&mut self, session_id: &str) -> bool {
        if self.session_ids.iter().any(|id| id == session_id) {
            return false;
        }
        self.session_ids.push(session_id.to_string());
        true
    }

    /// Display label: `name [category]`.
    pub fn label(&self) -> String {
        match &self.category {
            Some(category) => format!("{} [{}]", self.name, category),
            None => self.name.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_name_is_case_insensitive() {
        let topic = Topic::new("Rust Ownership", None);
        assert!(topic.has_name("rust ownership"));
        assert!(topic.has_name("RUST OWNERSHIP"));
        assert!(!topic.has_name("Rust"));
    }

    #[test]
    fn test_link_session_is_idempotent() {
        let mut topic = Topic::new("Algebra", Some("Mathematics".to_string()));
        assert!(topic.link_session("s1"));
        assert!(!topic.link_session("s1"));
        assert_eq!(topic.session_ids, vec!["s1".to_string()]);
    }

    #[test]
    fn test_serializes_camel_case() {
        let topic = Topic::new("Algebra", None);
        let json = serde_json::to_value(&topic).unwrap();
        assert!(json.get("lastExploredAt").is_some());
        assert!(json.get("conceptIds").is_some());
        assert!(json.get("category").is_none());
    }
}
