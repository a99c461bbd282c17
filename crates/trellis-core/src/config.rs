//! Application configuration model.
//!
//! Loaded from `config.toml` in the config directory. Every field is
//! optional in the file; command-line flags override file values.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default per-call timeout for the CLI, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Default CLI executable name, resolved through PATH.
pub const DEFAULT_CLAUDE_COMMAND: &str = "claude";

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Explicit path to the `claude` executable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_path: Option<PathBuf>,
    /// Model passed as `--model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Overrides the platform data directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            claude_path: None,
            model: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            data_dir: None,
        }
    }
}

impl AppConfig {
    /// The executable to spawn.
    pub fn claude_command(&self) -> PathBuf {
        self.claude_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLAUDE_COMMAND))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.claude_command(), PathBuf::from("claude"));
    }

    #[test]
    fn test_partial_file() {
        let config: AppConfig = toml::from_str(
            r#"
claude_path = "/opt/bin/claude"
timeout_secs = 60
"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 60);
        assert_eq!(config.claude_command(), PathBuf::from("/opt/bin/claude"));
        assert!(config.model.is_none());
    }
}
