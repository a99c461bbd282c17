//! Settings persistence in a single `settings.toml`.

use crate::paths::TrellisPaths;
use crate::storage::AtomicTomlFile;
use async_trait::async_trait;
use trellis_core::{error::Result, repository::SettingsRepository, settings::Settings};

pub struct TomlSettingsRepository {
    file: AtomicTomlFile<Settings>,
}

impl TomlSettingsRepository {
    pub fn new(paths: &TrellisPaths) -> Self {
        Self {
            file: AtomicTomlFile::new(paths.settings_file()),
        }
    }
}

#[async_trait]
impl SettingsRepository for TomlSettingsRepository {
    async fn load(&self) -> Result<Option<Settings>> {
        Ok(self.file.load()?)
    }

    async fn save(&self, settings: &Settings) -> Result<()> {
        let settings = settings.clone();
        self.file.update(Settings::default(), move |current| {
            *current = settings;
        })?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        Ok(self.file.remove()?)
    }
}
