use std::path::Path;

use crate::paths::Table;
use crate::storage::DirStorage;

/// Common trait for repositories backed by a [`DirStorage`] table.
pub trait StorageRepository {
    /// The table this repository owns
    const TABLE: Table;

    /// The entity name used in error messages
    const ENTITY_NAME: &'static str;

    /// Returns a reference to the underlying storage
    fn storage(&self) -> &DirStorage;

    /// Returns the base directory path
    fn base_dir(&self) -> &Path {
        self.storage().base_path()
    }
}
