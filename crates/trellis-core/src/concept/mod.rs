//! Concept domain module.

mod model;
mod repository;

pub use model::{Concept, FamiliarityLevel};
pub use repository::ConceptRepository;
