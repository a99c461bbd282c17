//! Dashboard feed cards.
//!
//! Cards are transient: they are generated from the learning history and
//! held in memory by the dashboard store, never persisted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum CardType {
    /// Continue where the learner left off
    Resume,
    /// Deepen an explored topic
    Expand,
    /// Something new
    Discover,
    /// How two explored topics relate
    Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardCard {
    pub id: String,
    #[serde(rename = "type")]
    pub card_type: CardType,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_explored: Option<DateTime<Utc>>,
}

impl DashboardCard {
    pub fn new(
        card_type: CardType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: crate::generate_id(),
            card_type,
            title: title.into(),
            description: description.into(),
            topic_id: None,
            suggested_prompt: None,
            last_explored: None,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.suggested_prompt = Some(prompt.into());
        self
    }

    pub fn with_topic(mut self, topic_id: impl Into<String>) -> Self {
        self.topic_id = Some(topic_id.into());
        self
    }
}
