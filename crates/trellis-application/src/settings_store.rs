//! User settings: teaching style, onboarding state and CLI path.

use std::sync::Arc;
use tokio::sync::RwLock;
use trellis_core::Result;
use trellis_core::repository::SettingsRepository;
use trellis_core::settings::{Settings, TeachingStyle, TeachingStyleUpdate};

/// Caches the singleton settings record in front of its repository.
pub struct SettingsStore {
    settings: RwLock<Option<Settings>>,
    repository: Arc<dyn SettingsRepository>,
}

impl SettingsStore {
    pub fn new(repository: Arc<dyn SettingsRepository>) -> Self {
        Self {
            settings: RwLock::new(None),
            repository,
        }
    }

    /// Loads the settings record, creating and persisting defaults when
    /// none exists yet.
    pub async fn load_settings(&self) -> Result<Settings> {
        let settings = match self.repository.load().await? {
            Some(settings) => settings,
            None => {
                let settings = Settings::default();
                self.repository.save(&settings).await?;
                tracing::info!("Created default settings");
                settings
            }
        };
        *self.settings.write().await = Some(settings.clone());
        Ok(settings)
    }

    /// Cached settings, loading them on first use.
    pub async fn settings(&self) -> Result<Settings> {
        if let Some(settings) = self.settings.read().await.clone() {
            return Ok(settings);
        }
        self.load_settings().await
    }

    /// Current teaching style; defaults when settings cannot be read.
    pub async fn teaching_style(&self) -> TeachingStyle {
        match self.settings().await {
            Ok(settings) => settings.teaching_style,
            Err(e) => {
                tracing::warn!("Falling back to default teaching style: {}", e);
                TeachingStyle::default()
            }
        }
    }

    pub async fn update_teaching_style(&self, update: TeachingStyleUpdate) -> Result<Settings> {
        self.modify(|settings| settings.teaching_style.merge(update))
            .await
    }

    pub async fn complete_onboarding(&self) -> Result<Settings> {
        self.modify(|settings| settings.onboarding_complete = true)
            .await
    }

    /// Stores a CLI path override; a blank path clears it.
    pub async fn set_cli_path(&self, path: Option<String>) -> Result<Settings> {
        let path = path
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());
        self.modify(|settings| settings.cli_path = path).await
    }

    /// Drops the cached record so the next read goes to storage.
    pub async fn invalidate(&self) {
        *self.settings.write().await = None;
    }

    async fn modify<F>(&self, f: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.settings().await?;
        f(&mut settings);
        self.repository.save(&settings).await?;
        *self.settings.write().await = Some(settings.clone());
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use trellis_core::settings::{Depth, TeachingParametersUpdate, TeachingPreset};
    use trellis_infrastructure::{TomlSettingsRepository, TrellisPaths};

    fn store(dir: &TempDir) -> SettingsStore {
        let paths = TrellisPaths::new(Some(dir.path())).unwrap();
        SettingsStore::new(Arc::new(TomlSettingsRepository::new(&paths)))
    }

    #[tokio::test]
    async fn test_load_creates_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = store(&dir).load_settings().await.unwrap();

        assert_eq!(settings, Settings::default());
        assert!(dir.path().join("settings.toml").exists());
    }

    #[tokio::test]
    async fn test_updates_persist_across_instances() {
        let dir = TempDir::new().unwrap();
        let first = store(&dir);
        first
            .update_teaching_style(TeachingStyleUpdate {
                preset: Some(TeachingPreset::HandsOn),
                parameters: TeachingParametersUpdate {
                    depth: Some(Depth::Deep),
                    ..Default::default()
                },
                custom_instructions: None,
            })
            .await
            .unwrap();
        first.complete_onboarding().await.unwrap();
        first
            .set_cli_path(Some("  /opt/claude  ".to_string()))
            .await
            .unwrap();

        let reloaded = store(&dir).load_settings().await.unwrap();
        assert_eq!(reloaded.teaching_style.preset, Some(TeachingPreset::HandsOn));
        assert_eq!(reloaded.teaching_style.parameters.depth, Depth::Deep);
        assert!(reloaded.teaching_style.parameters.use_analogies);
        assert!(reloaded.onboarding_complete);
        assert_eq!(reloaded.cli_path.as_deref(), Some("/opt/claude"));
    }

    #[tokio::test]
    async fn test_blank_cli_path_clears_override() {
        let dir = TempDir::new().unwrap();
        let store = store(&dir);
        store.set_cli_path(Some("/bin/claude".to_string())).await.unwrap();
        let settings = store.set_cli_path(Some("   ".to_string())).await.unwrap();
        assert!(settings.cli_path.is_none());
    }
}
