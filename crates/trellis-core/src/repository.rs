//! Repository trait re-exports.
//!
//! Centralized access to every repository trait so storage backends can
//! import them from one place.

pub use crate::concept::ConceptRepository;
pub use crate::session::{MessageRepository, SessionRepository};
pub use crate::settings::SettingsRepository;
pub use crate::topic::TopicRepository;
