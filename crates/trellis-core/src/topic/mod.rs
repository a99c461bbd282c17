//! Topic domain module.
//!
//! A topic groups the sessions and concepts of one subject area.

mod model;
mod repository;

pub use model::Topic;
pub use repository::TopicRepository;
