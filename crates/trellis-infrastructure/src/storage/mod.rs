//! File-level storage primitives.

pub mod atomic_toml;
pub mod dir_storage;

pub use atomic_toml::{AtomicTomlError, AtomicTomlFile};
pub use dir_storage::{DirStorage, validate_record_id};
