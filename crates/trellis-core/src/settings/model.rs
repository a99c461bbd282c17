//! Settings domain model.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Fixed key of the singleton settings record.
pub const SETTINGS_ID: &str = "user-settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum TeachingPreset {
    Socratic,
    HandsOn,
    Theoretical,
    Storyteller,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Depth {
    Shallow,
    #[default]
    Moderate,
    Deep,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Pace {
    Quick,
    #[default]
    Measured,
    Thorough,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ExampleFrequency {
    Minimal,
    #[default]
    Moderate,
    Frequent,
}

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Formality {
    Casual,
    #[default]
    Balanced,
    Formal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingParameters {
    pub depth: Depth,
    pub pace: Pace,
    pub example_frequency: ExampleFrequency,
    pub use_analogies: bool,
    pub formality: Formality,
}

impl Default for TeachingParameters {
    fn default() -> Self {
        Self {
            depth: Depth::Moderate,
            pace: Pace::Measured,
            example_frequency: ExampleFrequency::Moderate,
            use_analogies: true,
            formality: Formality::Balanced,
        }
    }
}

/// How the tutor should teach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeachingStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<TeachingPreset>,
    #[serde(default)]
    pub parameters: TeachingParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
}

/// Field-wise partial update of [`TeachingParameters`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeachingParametersUpdate {
    pub depth: Option<Depth>,
    pub pace: Option<Pace>,
    pub example_frequency: Option<ExampleFrequency>,
    pub use_analogies: Option<bool>,
    pub formality: Option<Formality>,
}

/// Partial update of a [`TeachingStyle`]; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeachingStyleUpdate {
    pub preset: Option<TeachingPreset>,
    pub parameters: TeachingParametersUpdate,
    pub custom_instructions: Option<String>,
}

impl TeachingStyle {
    /// Applies a partial update, merging parameters field by field.
    pub fn merge(&mut self, update: TeachingStyleUpdate) {
        if let Some(preset) = update.preset {
            self.preset = Some(preset);
        }
        if let Some(instructions) = update.custom_instructions {
            let trimmed = instructions.trim();
            self.custom_instructions = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
        }

        let params = update.parameters;
        let current = &mut self.parameters;
        if let Some(depth) = params.depth {
            current.depth = depth;
        }
        if let Some(pace) = params.pace {
            current.pace = pace;
        }
        if let Some(frequency) = params.example_frequency {
            current.example_frequency = frequency;
        }
        if let Some(use_analogies) = params.use_analogies {
            current.use_analogies = use_analogies;
        }
        if let Some(formality) = params.formality {
            current.formality = formality;
        }
    }
}

/// The singleton settings record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub id: String,
    #[serde(default)]
    pub teaching_style: TeachingStyle,
    #[serde(default)]
    pub onboarding_complete: bool,
    /// Path to the CLI executable, overriding PATH lookup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cli_path: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id: SETTINGS_ID.to_string(),
            teaching_style: TeachingStyle::default(),
            onboarding_complete: false,
            cli_path: None,
        }
    }
}
