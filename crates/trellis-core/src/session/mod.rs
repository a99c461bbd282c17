//! Session domain module.
//!
//! This module contains all session-related domain models and repository
//! interfaces.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`)
//! - `message`: Conversation message types (`MessageRole`, `Message`, `PromptContext`)
//! - `repository`: Repository traits for session and message persistence

mod message;
mod model;
mod repository;

pub use message::{Message, MessageRole, PromptContext};
pub use model::Session;
pub use repository::{MessageRepository, SessionRepository};
