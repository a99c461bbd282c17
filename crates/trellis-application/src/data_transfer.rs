//! JSON export and import of every table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use trellis_core::concept::Concept;
use trellis_core::session::{Message, Session};
use trellis_core::settings::Settings;
use trellis_core::topic::Topic;
use trellis_core::{Result, TrellisError};
use trellis_infrastructure::storage::validate_record_id;

use crate::context::Repositories;

pub const EXPORT_VERSION: u32 = 1;

pub const UNSUPPORTED_VERSION: &str = "Unsupported export version";
pub const INVALID_FORMAT: &str = "Invalid export file format";
pub const PARSE_FAILED: &str = "Failed to parse file";

/// A full backup document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub topics: Vec<Topic>,
    #[serde(default)]
    pub concepts: Vec<Concept>,
    #[serde(default)]
    pub sessions: Vec<Session>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

impl ExportData {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses and shape-checks an export document.
    ///
    /// The version is not checked here; [`DataTransfer::import_data`]
    /// rejects unsupported versions.
    pub fn parse(content: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(content).map_err(|_| TrellisError::import(PARSE_FAILED))?;

        let has_version = value.get("version").is_some_and(|v| v.is_number());
        let has_topics = value.get("topics").is_some_and(|t| t.is_array());
        if !has_version || !has_topics {
            return Err(TrellisError::import(INVALID_FORMAT));
        }

        serde_json::from_value(value).map_err(|e| {
            tracing::warn!("Export document failed to deserialize: {}", e);
            TrellisError::import(INVALID_FORMAT)
        })
    }

    /// Rejects a document holding any id the record tables cannot store.
    pub fn check_record_ids(&self) -> Result<()> {
        let ids = self
            .topics
            .iter()
            .map(|t| t.id.as_str())
            .chain(self.concepts.iter().map(|c| c.id.as_str()))
            .chain(self.sessions.iter().map(|s| s.id.as_str()))
            .chain(self.messages.iter().map(|m| m.id.as_str()));
        for id in ids {
            if let Err(e) = validate_record_id(id) {
                tracing::warn!("Export document rejected: {}", e);
                return Err(TrellisError::import(INVALID_FORMAT));
            }
        }
        Ok(())
    }
}

/// `trellis-backup-YYYY-MM-DD.json`
pub fn default_export_file_name(now: DateTime<Utc>) -> String {
    format!("trellis-backup-{}.json", now.format("%Y-%m-%d"))
}

pub struct DataTransfer {
    repositories: Repositories,
}

impl DataTransfer {
    pub fn new(repositories: Repositories) -> Self {
        Self { repositories }
    }

    pub async fn export_all(&self) -> Result<ExportData> {
        Ok(ExportData {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            topics: self.repositories.topics.list_all().await?,
            concepts: self.repositories.concepts.list_all().await?,
            sessions: self.repositories.sessions.list_all().await?,
            messages: self.repositories.messages.list_all().await?,
            settings: self.repositories.settings.load().await?,
        })
    }

    pub async fn export_to_file(&self, path: &Path) -> Result<ExportData> {
        let data = self.export_all().await?;
        tokio::fs::write(path, data.to_json()?).await?;
        tracing::info!(
            "Exported {} topics and {} sessions to {}",
            data.topics.len(),
            data.sessions.len(),
            path.display()
        );
        Ok(data)
    }

    /// Replaces every table, settings included, with the document's records.
    ///
    /// Nothing is touched unless every record id is storable. If a write
    /// still fails part way, the previous contents are written back.
    pub async fn import_data(&self, data: &ExportData) -> Result<()> {
        if data.version != EXPORT_VERSION {
            return Err(TrellisError::import(UNSUPPORTED_VERSION));
        }
        data.check_record_ids()?;

        let previous = self.export_all().await?;
        if let Err(e) = self.replace_all(data).await {
            tracing::error!("Import failed, restoring previous data: {}", e);
            if let Err(restore_err) = self.replace_all(&previous).await {
                tracing::error!("Failed to restore data after import error: {}", restore_err);
            }
            return Err(e);
        }

        tracing::info!(
            "Imported {} topics, {} concepts, {} sessions, {} messages",
            data.topics.len(),
            data.concepts.len(),
            data.sessions.len(),
            data.messages.len()
        );
        Ok(())
    }

    async fn replace_all(&self, data: &ExportData) -> Result<()> {
        self.repositories.messages.clear().await?;
        self.repositories.sessions.clear().await?;
        self.repositories.concepts.clear().await?;
        self.repositories.topics.clear().await?;
        self.repositories.settings.clear().await?;

        for topic in &data.topics {
            self.repositories.topics.save(topic).await?;
        }
        self.repositories.concepts.save_all(&data.concepts).await?;
        for session in &data.sessions {
            self.repositories.sessions.save(session).await?;
        }
        for message in &data.messages {
            self.repositories.messages.save(message).await?;
        }
        if let Some(settings) = &data.settings {
            self.repositories.settings.save(settings).await?;
        }
        Ok(())
    }

    pub async fn import_from_file(&self, path: &Path) -> Result<ExportData> {
        let content = tokio::fs::read_to_string(path).await?;
        let data = ExportData::parse(&content)?;
        self.import_data(&data).await?;
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_default_export_file_name() {
        let now = Utc.with_ymd_and_hms(2026, 3, 7, 18, 30, 0).unwrap();
        assert_eq!(default_export_file_name(now), "trellis-backup-2026-03-07.json");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        let err = ExportData::parse("not json at all").unwrap_err();
        assert!(err.is_import());
        assert!(err.to_string().contains(PARSE_FAILED));
    }

    #[test]
    fn test_parse_requires_version_and_topics() {
        for content in [
            r#"{"topics": []}"#,
            r#"{"version": "1", "topics": []}"#,
            r#"{"version": 1, "topics": {}}"#,
        ] {
            let err = ExportData::parse(content).unwrap_err();
            assert!(err.to_string().contains(INVALID_FORMAT), "{}", content);
        }
    }

    #[test]
    fn test_parse_minimal_document() {
        let data = ExportData::parse(
            r#"{"version": 1, "exportedAt": "2026-01-02T03:04:05Z", "topics": [], "settings": null}"#,
        )
        .unwrap();
        assert_eq!(data.version, 1);
        assert!(data.concepts.is_empty());
        assert!(data.settings.is_none());
    }

    #[test]
    fn test_check_record_ids_rejects_path_like_ids() {
        let mut data = ExportData::parse(
            r#"{"version": 1, "exportedAt": "2026-01-02T03:04:05Z", "topics": []}"#,
        )
        .unwrap();
        assert!(data.check_record_ids().is_ok());

        data.topics.push(Topic::new("Broken", None));
        data.topics[0].id = "bad id/..".to_string();
        let err = data.check_record_ids().unwrap_err();
        assert!(err.to_string().contains(INVALID_FORMAT));
    }
}
