pub mod agent;
pub mod concept;
pub mod config;
pub mod error;
pub mod feed;
pub mod repository;
pub mod session;
pub mod settings;
pub mod summary;
pub mod topic;

// Re-export common error type
pub use error::{Result, TrellisError};

use uuid::Uuid;

/// Generates a fresh record id (UUID v4).
///
/// # Examples
///
/// ```
/// let a = trellis_core::generate_id();
/// let b = trellis_core::generate_id();
/// assert_ne!(a, b);
/// assert_eq!(a.len(), 36);
/// ```
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
