//! Directory-backed record storage.
//!
//! Each record is one TOML file named after its id:
//!
//! ```text
//! base_dir/
//! ├── 6f1c...e2.toml
//! └── 93ab...07.toml
//! ```
//!
//! Writes go to a hidden temporary file first and are renamed into place,
//! so a crash never leaves a half-written record behind.

use serde::{Serialize, de::DeserializeOwned};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use trellis_core::{Result, TrellisError};

const RECORD_EXTENSION: &str = "toml";

#[derive(Debug, Clone)]
pub struct DirStorage {
    base_dir: PathBuf,
}

impl DirStorage {
    /// Opens (and creates if needed) a storage directory.
    pub async fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await.map_err(|e| {
            TrellisError::io(format!(
                "Failed to create storage directory {}: {}",
                base_dir.display(),
                e
            ))
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_dir
    }

    /// Loads one record, `None` if no file exists for `id`.
    pub async fn load<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>> {
        let path = self.record_path(id)?;
        match fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(toml::from_str(&content)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save<T: Serialize>(&self, id: &str, record: &T) -> Result<()> {
        let path = self.record_path(id)?;
        let tmp_path = self.base_dir.join(format!(".{}.{}.tmp", id, RECORD_EXTENSION));
        let content = toml::to_string_pretty(record)?;

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(content.as_bytes()).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &path).await?;
        Ok(())
    }

    /// Removes one record. Deleting a missing record is a no-op.
    pub async fn delete(&self, id: &str) -> Result<()> {
        let path = self.record_path(id)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Loads every record as `(id, record)` pairs, in no particular order.
    ///
    /// Files that fail to parse are skipped with a warning rather than
    /// failing the whole listing.
    pub async fn load_all<T: DeserializeOwned>(&self) -> Result<Vec<(String, T)>> {
        let mut records = Vec::new();
        for (id, path) in self.record_files().await? {
            let content = fs::read_to_string(&path).await?;
            match toml::from_str::<T>(&content) {
                Ok(record) => records.push((id, record)),
                Err(e) => {
                    tracing::warn!("Skipping unreadable record {}: {}", path.display(), e);
                }
            }
        }
        Ok(records)
    }

    /// Removes every record file.
    pub async fn clear(&self) -> Result<()> {
        for (_, path) in self.record_files().await? {
            fs::remove_file(&path).await?;
        }
        Ok(())
    }

    async fn record_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut entries = match fs::read_dir(&self.base_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(RECORD_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            if stem.starts_with('.') {
                continue;
            }
            files.push((stem.to_string(), path));
        }
        Ok(files)
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        validate_record_id(id)?;
        Ok(self.base_dir.join(format!("{}.{}", id, RECORD_EXTENSION)))
    }
}

/// Record ids become file names: ASCII alphanumerics, `-`, `_` and `.`,
/// not empty and not starting with a dot.
pub fn validate_record_id(id: &str) -> Result<()> {
    let valid = !id.is_empty()
        && !id.starts_with('.')
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.');
    if !valid {
        return Err(TrellisError::data_access(format!(
            "Invalid record id: '{}'",
            id
        )));
    }
    Ok(())
}
