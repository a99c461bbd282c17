//! Unified path management for trellis files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/trellis/           # Config directory
//! ├── config.toml              # Application configuration
//! └── logs/                    # Application logs
//!     └── trellis.log.YYYY-MM-DD
//!
//! ~/.local/share/trellis/      # Data directory (overridable)
//! ├── settings.toml            # Singleton settings record
//! ├── topics/                  # One TOML file per record
//! ├── concepts/
//! ├── sessions/
//! ├── messages/
//! └── demos/                   # Generated HTML demos
//! ```

use std::path::{Path, PathBuf};
use thiserror::Error;
use trellis_core::TrellisError;

const APP_DIR_NAME: &str = "trellis";

/// Errors that can occur during path resolution.
#[derive(Debug, Error)]
pub enum PathError {
    #[error("Cannot find home directory")]
    HomeDirNotFound,
}

impl From<PathError> for TrellisError {
    fn from(err: PathError) -> Self {
        TrellisError::config(err.to_string())
    }
}

/// Record tables kept under the data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Topics,
    Concepts,
    Sessions,
    Messages,
}

impl Table {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Table::Topics => "topics",
            Table::Concepts => "concepts",
            Table::Sessions => "sessions",
            Table::Messages => "messages",
        }
    }
}

/// Resolves every location trellis reads or writes.
///
/// The config directory always follows the platform convention. The data
/// directory can be redirected (tests, `--data-dir`, `data_dir` in config).
#[derive(Debug, Clone)]
pub struct TrellisPaths {
    data_dir: PathBuf,
}

impl TrellisPaths {
    /// Uses `data_dir` when given, otherwise the platform data directory.
    pub fn new(data_dir: Option<&Path>) -> Result<Self, PathError> {
        let data_dir = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => Self::default_data_dir()?,
        };
        Ok(Self { data_dir })
    }

    /// Returns the trellis configuration directory (e.g. `~/.config/trellis/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn logs_dir() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("logs"))
    }

    /// Returns the platform data directory (e.g. `~/.local/share/trellis/`).
    pub fn default_data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or(PathError::HomeDirNotFound)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn table_dir(&self, table: Table) -> PathBuf {
        self.data_dir.join(table.dir_name())
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join("settings.toml")
    }

    pub fn demos_dir(&self) -> PathBuf {
        self.data_dir.join("demos")
    }
}
