//! Topic summary: a knowledge graph plus follow-up suggestions.

use crate::concept::FamiliarityLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Graph depth the generator is asked to respect.
pub const MAX_GRAPH_DEPTH: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SuggestionType {
    Deepen,
    Connect,
    Challenge,
    Apply,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSuggestion {
    pub id: String,
    pub title: String,
    pub description: String,
    pub suggested_prompt: String,
    #[serde(rename = "type")]
    pub suggestion_type: SuggestionType,
}

impl TopicSuggestion {
    pub fn new(
        suggestion_type: SuggestionType,
        title: impl Into<String>,
        description: impl Into<String>,
        suggested_prompt: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::generate_id(),
            title: title.into(),
            description: description.into(),
            suggested_prompt: suggested_prompt.into(),
            suggestion_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KnowledgeGraphNode {
    pub concept_id: String,
    pub concept_name: String,
    pub familiarity_level: FamiliarityLevel,
    #[serde(default)]
    pub children: Vec<KnowledgeGraphNode>,
    /// Names of concepts in other branches
    #[serde(default)]
    pub related_concepts: Vec<String>,
}

impl KnowledgeGraphNode {
    /// Depth of the subtree rooted at this node (a leaf is 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Total number of nodes in this subtree.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSummary {
    pub id: String,
    pub topic_id: String,
    pub knowledge_graph: Vec<KnowledgeGraphNode>,
    pub follow_up_suggestions: Vec<TopicSuggestion>,
    pub generated_at: DateTime<Utc>,
}

impl TopicSummary {
    pub fn new(
        topic_id: impl Into<String>,
        knowledge_graph: Vec<KnowledgeGraphNode>,
        follow_up_suggestions: Vec<TopicSuggestion>,
    ) -> Self {
        Self {
            id: crate::generate_id(),
            topic_id: topic_id.into(),
            knowledge_graph,
            follow_up_suggestions,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> KnowledgeGraphNode {
        KnowledgeGraphNode {
            concept_id: name.to_lowercase(),
            concept_name: name.to_string(),
            familiarity_level: FamiliarityLevel::Introduced,
            children: Vec::new(),
            related_concepts: Vec::new(),
        }
    }

    #[test]
    fn test_node_depth_and_count() {
        let mut root = leaf("Ownership");
        let mut borrowing = leaf("Borrowing");
        borrowing.children.push(leaf("Lifetimes"));
        root.children.push(borrowing);
        root.children.push(leaf("Moves"));

        assert_eq!(root.depth(), 3);
        assert_eq!(root.node_count(), 4);
    }
}
