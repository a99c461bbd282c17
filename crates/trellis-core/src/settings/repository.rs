//! Settings repository trait.

use super::model::Settings;
use crate::error::Result;
use async_trait::async_trait;

/// Persistence of the singleton settings record.
#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Loads the settings record, `None` when it was never written.
    async fn load(&self) -> Result<Option<Settings>>;

    async fn save(&self, settings: &Settings) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}
