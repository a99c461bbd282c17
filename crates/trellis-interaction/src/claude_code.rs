//! ClaudeCodeAgent - a [`CompletionAgent`] that wraps the Claude CLI.
//!
//! Each completion spawns `claude -p <prompt> --output-format text` and
//! waits for the whole reply. Failures are reported inside the
//! [`CompletionResponse`], never as a Rust error.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;
use trellis_core::agent::{CliStatus, CompletionAgent, CompletionRequest, CompletionResponse};
use trellis_core::config::{AppConfig, DEFAULT_CLAUDE_COMMAND, DEFAULT_TIMEOUT_SECS};

/// Timeout for each step of the status probe.
pub const STATUS_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Message used when the process fails without writing to stderr.
const GENERIC_EXIT_ERROR: &str = "Claude CLI exited with an error";

#[derive(Debug, Clone)]
pub struct ClaudeCodeAgent {
    /// Path to the `claude` executable. If None, searches in PATH.
    claude_path: Option<PathBuf>,
    /// Passed through as `--model`
    model: Option<String>,
    timeout: Duration,
}

impl ClaudeCodeAgent {
    /// Creates an agent that looks `claude` up in PATH.
    pub fn new() -> Self {
        Self {
            claude_path: None,
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Creates an agent from the application config.
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            claude_path: config.claude_path.clone(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    pub fn with_path(mut self, path: PathBuf) -> Self {
        self.claude_path = Some(path);
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn program(&self) -> PathBuf {
        self.claude_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CLAUDE_COMMAND))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(self.program());
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // macOS .app bundles don't inherit the shell PATH
        #[cfg(target_os = "macos")]
        {
            if let Ok(current_path) = std::env::var("PATH") {
                let home_dir = std::env::var("HOME").unwrap_or_default();
                let extra = [
                    "/usr/local/bin".to_string(),
                    "/opt/homebrew/bin".to_string(),
                    format!("{}/.local/bin", home_dir),
                    format!("{}/.claude/local", home_dir),
                    format!("{}/.volta/bin", home_dir),
                ];
                let mut new_path = current_path;
                for path in extra {
                    if !new_path.split(':').any(|p| p == path) {
                        new_path = format!("{}:{}", new_path, path);
                    }
                }
                cmd.env("PATH", new_path);
            }
        }

        cmd
    }

    /// Probes `claude --version` and then `claude auth status`.
    pub async fn check_status(&self) -> CliStatus {
        log::info!("Checking Claude CLI installation");

        let version = timeout(
            STATUS_CHECK_TIMEOUT,
            self.command().arg("--version").output(),
        )
        .await;

        let installed = match version {
            Ok(Ok(output)) => {
                if output.status.success() {
                    log::info!(
                        "Claude CLI found: {}",
                        String::from_utf8_lossy(&output.stdout).trim()
                    );
                } else {
                    log::warn!("claude --version exited with {}", output.status);
                }
                output.status.success()
            }
            Ok(Err(e)) => {
                log::error!("Failed to execute claude --version: {}", e);
                return CliStatus {
                    error: Some(format!("Failed to execute claude command: {}", e)),
                    step_failed: Some("version_check".to_string()),
                    ..Default::default()
                };
            }
            Err(_) => {
                log::error!("Timeout while checking Claude CLI version");
                return CliStatus {
                    error: Some(format!(
                        "Timeout after {}s while checking Claude CLI",
                        STATUS_CHECK_TIMEOUT.as_secs()
                    )),
                    step_failed: Some("version_check_timeout".to_string()),
                    ..Default::default()
                };
            }
        };

        if !installed {
            return CliStatus::default();
        }

        let auth = timeout(
            STATUS_CHECK_TIMEOUT,
            self.command().arg("auth").arg("status").output(),
        )
        .await;

        let output = match auth {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                log::error!("Failed to execute claude auth status: {}", e);
                return CliStatus {
                    installed: true,
                    error: Some(format!("Failed to check auth status: {}", e)),
                    step_failed: Some("auth_check".to_string()),
                    ..Default::default()
                };
            }
            Err(_) => {
                log::error!("Timeout while checking Claude CLI auth status");
                return CliStatus {
                    installed: true,
                    error: Some(format!(
                        "Timeout after {}s while checking auth status",
                        STATUS_CHECK_TIMEOUT.as_secs()
                    )),
                    step_failed: Some("auth_check_timeout".to_string()),
                    ..Default::default()
                };
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        log::debug!("Auth stdout: {}", stdout);
        log::debug!("Auth stderr: {}", stderr);

        let authenticated = output.status.success() && !reports_logged_out(&stdout, &stderr);
        let account = if authenticated {
            find_account_line(&stdout)
        } else {
            None
        };
        log::info!("Authentication status: {}", authenticated);

        CliStatus {
            installed: true,
            authenticated,
            account,
            error: None,
            step_failed: None,
        }
    }
}

impl Default for ClaudeCodeAgent {
    fn default() -> Self {
        Self::new()
    }
}

fn reports_logged_out(stdout: &str, stderr: &str) -> bool {
    [stdout, stderr].iter().any(|text| {
        let lower = text.to_lowercase();
        lower.contains("not logged in") || lower.contains("no active account")
    })
}

fn find_account_line(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find(|line| line.contains('@') || line.contains("account"))
        .map(|line| line.trim().to_string())
}

#[async_trait]
impl CompletionAgent for ClaudeCodeAgent {
    async fn complete(&self, request: CompletionRequest) -> CompletionResponse {
        let full_prompt = request.full_prompt();
        log::info!("ClaudeCodeAgent executing...");
        log::debug!("Prompt length: {} chars", full_prompt.len());
        log::trace!("Full prompt: {}", full_prompt);

        let mut cmd = self.command();
        cmd.arg("-p")
            .arg(&full_prompt)
            .arg("--output-format")
            .arg("text");
        if let Some(model) = &self.model {
            cmd.arg("--model").arg(model);
            log::debug!("Using model: {}", model);
        }

        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                log::error!("Claude CLI not found at {}: {}", self.program().display(), e);
                return CompletionResponse::not_found(format!("Claude CLI not found: {}", e));
            }
            Ok(Err(e)) => {
                log::error!("Failed to spawn claude process: {}", e);
                return CompletionResponse::failed(format!(
                    "Failed to spawn claude process: {}",
                    e
                ));
            }
            Err(_) => {
                log::error!("Claude CLI timed out after {}s", self.timeout.as_secs());
                return CompletionResponse::failed(format!(
                    "Claude CLI timed out after {}s",
                    self.timeout.as_secs()
                ));
            }
        };

        let content = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() && content.is_empty() {
            log::warn!("Claude CLI exited with error: {}", stderr);
            return CompletionResponse::failed(if stderr.is_empty() {
                GENERIC_EXIT_ERROR.to_string()
            } else {
                stderr
            });
        }

        log::info!("ClaudeCodeAgent completed");
        log::debug!("Output length: {} chars", content.len());

        CompletionResponse {
            content,
            error: (!stderr.is_empty()).then_some(stderr),
            cli_not_found: false,
        }
    }

    fn name(&self) -> &str {
        "ClaudeCodeAgent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logged_out_detection() {
        assert!(reports_logged_out("You are Not Logged In.", ""));
        assert!(reports_logged_out("", "error: no active account"));
        assert!(!reports_logged_out("Logged in as ada@example.com", ""));
    }

    #[test]
    fn test_account_line() {
        let stdout = "Status: ok\n  Logged in as ada@example.com  \nPlan: pro";
        assert_eq!(
            find_account_line(stdout).as_deref(),
            Some("Logged in as ada@example.com")
        );
        assert!(find_account_line("Status: ok").is_none());
    }

    #[test]
    fn test_from_config() {
        let config = AppConfig {
            claude_path: Some(PathBuf::from("/opt/claude")),
            model: Some("opus".to_string()),
            timeout_secs: 12,
            data_dir: None,
        };
        let agent = ClaudeCodeAgent::from_config(&config);
        assert_eq!(agent.program(), PathBuf::from("/opt/claude"));
        assert_eq!(agent.timeout, Duration::from_secs(12));
        assert_eq!(agent.model.as_deref(), Some("opus"));
    }

    #[tokio::test]
    async fn test_missing_executable_reports_cli_not_found() {
        let agent = ClaudeCodeAgent::new().with_path(PathBuf::from("/nonexistent/trellis/claude"));
        let response = agent.complete(CompletionRequest::new("hello")).await;
        assert!(response.cli_not_found);
        assert!(response.content.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_arguments_reach_the_process() {
        // `echo` stands in for the CLI and prints its own argv
        let agent = ClaudeCodeAgent::new().with_path(PathBuf::from("/bin/echo"));
        let response = agent
            .complete(CompletionRequest::new("hello").with_system_prompt("Be brief."))
            .await;

        assert!(!response.cli_not_found);
        assert!(response.error.is_none());
        assert!(response.content.starts_with("-p Be brief."));
        assert!(response.content.ends_with("User: hello --output-format text"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_process_without_output() {
        let agent = ClaudeCodeAgent::new().with_path(PathBuf::from("/bin/false"));
        if !agent.program().exists() {
            return;
        }
        let response = agent.complete(CompletionRequest::new("hello")).await;
        assert!(response.is_failure());
        assert_eq!(response.error.as_deref(), Some(GENERIC_EXIT_ERROR));
    }

    #[tokio::test]
    async fn test_status_when_missing() {
        let agent = ClaudeCodeAgent::new().with_path(PathBuf::from("/nonexistent/trellis/claude"));
        let status = agent.check_status().await;
        assert!(!status.installed);
        assert!(!status.authenticated);
        assert_eq!(status.step_failed.as_deref(), Some("version_check"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_status_with_stand_in_binary() {
        let agent = ClaudeCodeAgent::new().with_path(PathBuf::from("/bin/echo"));
        let status = agent.check_status().await;
        assert!(status.installed);
        assert!(status.authenticated);
        assert!(status.account.is_none());
    }
}
