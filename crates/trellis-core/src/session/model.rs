//! Session domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One continuous conversation, optionally tied to a topic.
///
/// A session may live only in memory (a draft) until its first message is
/// sent; persistence is decided by the session store, not by this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Unique session identifier (UUID format)
    pub id: String,
    /// Unset until the conversation is classified
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub extracted_concept_ids: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl Session {
    pub fn new(topic_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: crate::generate_id(),
            topic_id,
            extracted_concept_ids: Vec::new(),
            started_at: now,
            last_message_at: now,
        }
    }

    /// Assigns the inferred topic id if none has been set yet.
    ///
    /// Returns `true` when the assignment happened.
    pub fn assign_topic(&mut self, topic_id: &str) -> bool {
        if self.topic_id.is_some() {
            return false;
        }
        self.topic_id = Some(topic_id.to_string());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_topic_only_once() {
        let mut session = Session::new(None);
        assert!(session.assign_topic("t1"));
        assert!(!session.assign_topic("t2"));
        assert_eq!(session.topic_id.as_deref(), Some("t1"));
    }

    #[test]
    fn test_new_session_timestamps_match() {
        let session = Session::new(Some("t1".to_string()));
        assert_eq!(session.started_at, session.last_message_at);
        assert!(session.extracted_concept_ids.is_empty());
    }
}
