//! The error type shared by every trellis crate.
//!
//! Failures of the external CLI are not errors at this level: generation
//! services fold them into their results. What surfaces here is storage,
//! configuration and import trouble.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum TrellisError {
    /// A record looked up by id does not exist
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    #[error("IO error: {message}")]
    Io { message: String },

    /// A repository could not read or write its table
    #[error("Data access error: {0}")]
    DataAccess(String),

    #[error("Serialization error: {format} - {message}")]
    Serialization {
        /// "TOML" or "JSON"
        format: String,
        message: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    /// An export document was rejected; the message is shown to the user as is
    #[error("{0}")]
    Import(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TrellisError {
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn data_access(message: impl Into<String>) -> Self {
        Self::DataAccess(message.into())
    }

    pub fn import(message: impl Into<String>) -> Self {
        Self::Import(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }

    pub fn is_import(&self) -> bool {
        matches!(self, Self::Import(_))
    }
}

impl From<std::io::Error> for TrellisError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for TrellisError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for TrellisError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for TrellisError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for TrellisError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<String> for TrellisError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

pub type Result<T> = std::result::Result<T, TrellisError>;
