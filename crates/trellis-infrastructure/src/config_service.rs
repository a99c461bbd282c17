//! Configuration service implementation.
//!
//! Loads [`AppConfig`] from `config.toml` and caches it.

use crate::paths::TrellisPaths;
use crate::storage::AtomicTomlFile;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use trellis_core::{config::AppConfig, error::Result};

/// Configuration service that loads and caches the application config.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<AppConfig>>>,
}

impl ConfigService {
    /// Uses the default `~/.config/trellis/config.toml`.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(TrellisPaths::config_file()?))
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self {
            path,
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Returns the configuration, loading it on first access.
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn get_config(&self) -> Result<AppConfig> {
        {
            let cached = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = AtomicTomlFile::<AppConfig>::new(self.path.clone())
            .load()?
            .unwrap_or_default();
        tracing::debug!("Loaded config from {}", self.path.display());

        let mut cache = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(loaded.clone());
        Ok(loaded)
    }

    /// Writes the configuration and refreshes the cache.
    pub fn save_config(&self, config: &AppConfig) -> Result<()> {
        AtomicTomlFile::<AppConfig>::new(self.path.clone()).save(config)?;
        let mut cache = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cache = Some(config.clone());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cache = self.config.write().unwrap_or_else(|e| e.into_inner());
        *cache = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        assert_eq!(service.get_config().unwrap(), AppConfig::default());
    }

    #[test]
    fn test_cache_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = 30\n").unwrap();

        let service = ConfigService::with_path(path.clone());
        assert_eq!(service.get_config().unwrap().timeout_secs, 30);

        std::fs::write(&path, "timeout_secs = 90\n").unwrap();
        assert_eq!(service.get_config().unwrap().timeout_secs, 30);

        service.invalidate_cache();
        assert_eq!(service.get_config().unwrap().timeout_secs, 90);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "timeout_secs = \"soon\"\n").unwrap();

        let err = ConfigService::with_path(path).get_config().unwrap_err();
        assert!(err.is_serialization());
    }

    #[test]
    fn test_save_config_updates_cache() {
        let temp_dir = TempDir::new().unwrap();
        let service = ConfigService::with_path(temp_dir.path().join("config.toml"));
        let config = AppConfig {
            model: Some("sonnet".to_string()),
            ..Default::default()
        };
        service.save_config(&config).unwrap();
        assert_eq!(service.get_config().unwrap().model.as_deref(), Some("sonnet"));
    }
}
