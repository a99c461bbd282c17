//! Pulls JSON payloads out of free-form CLI output.
//!
//! The CLI is asked to return bare JSON but frequently wraps it in prose or
//! markdown fences, so the outermost `{ ... }` span is taken.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("Invalid regex"));

/// Why a JSON payload could not be obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonExtractError {
    /// No `{ ... }` span in the output
    NoObject,
    /// A span was found but did not deserialize
    Malformed(String),
}

/// Returns the span from the first `{` to the last `}`.
pub fn extract_json_object(content: &str) -> Option<&str> {
    JSON_OBJECT.find(content).map(|m| m.as_str())
}

pub fn parse_json_object<T: DeserializeOwned>(content: &str) -> Result<T, JsonExtractError> {
    let raw = extract_json_object(content.trim()).ok_or(JsonExtractError::NoObject)?;
    serde_json::from_str(raw).map_err(|e| JsonExtractError::Malformed(e.to_string()))
}
