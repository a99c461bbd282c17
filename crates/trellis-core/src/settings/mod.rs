//! Settings domain module.
//!
//! Settings are a singleton record holding teaching-style preferences and
//! the onboarding flag.

mod model;
mod repository;

pub use model::{
    Depth, ExampleFrequency, Formality, Pace, SETTINGS_ID, Settings, TeachingParameters,
    TeachingParametersUpdate, TeachingPreset, TeachingStyle, TeachingStyleUpdate,
};
pub use repository::SettingsRepository;
