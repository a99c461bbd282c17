use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use trellis_application::{AppContext, Repositories};
use trellis_core::config::AppConfig;
use trellis_infrastructure::{ConfigService, TrellisPaths};
use trellis_interaction::ClaudeCodeAgent;

mod commands;
mod helper;
mod render;
mod shell;

const LOG_FILE_PREFIX: &str = "trellis.log";
const HISTORY_FILE: &str = "history.txt";

#[derive(Parser, Debug)]
#[command(name = "trellis")]
#[command(about = "Trellis - learn anything with the Claude CLI, and keep what you learned", long_about = None)]
struct Cli {
    /// Directory holding topics, concepts, sessions and messages
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Config file to use instead of ~/.config/trellis/config.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Path to the claude executable
    #[arg(long)]
    claude_path: Option<PathBuf>,

    /// Log filter, e.g. `debug` or `trellis_application=trace` (overrides RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    /// Flags win over the config file.
    fn apply_to(&self, config: &mut AppConfig) {
        if let Some(dir) = &self.data_dir {
            config.data_dir = Some(dir.clone());
        }
        if let Some(path) = &self.claude_path {
            config.claude_path = Some(path.clone());
        }
    }
}

/// Logs go to a daily file so the terminal stays clean.
fn init_logging(level: Option<&str>) -> Result<WorkerGuard> {
    let logs_dir = TrellisPaths::logs_dir()?;
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("Failed to create {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(&logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = match level {
        Some(level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false),
        )
        .init();
    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.log_level.as_deref())?;

    let config_service = match &cli.config {
        Some(path) => ConfigService::with_path(path.clone()),
        None => ConfigService::new()?,
    };
    let mut config = config_service
        .get_config()
        .with_context(|| format!("Failed to read {}", config_service.path().display()))?;
    cli.apply_to(&mut config);
    tracing::info!("Starting trellis with config from {}", config_service.path().display());

    let paths = TrellisPaths::new(config.data_dir.as_deref())?;
    let repositories = Repositories::open(&paths).await?;

    // The settings override only applies when neither flag nor config names a path.
    let mut agent = ClaudeCodeAgent::from_config(&config);
    if config.claude_path.is_none() {
        if let Some(path) = repositories.settings.load().await?.and_then(|s| s.cli_path) {
            agent = agent.with_path(PathBuf::from(path));
        }
    }
    let agent = Arc::new(agent);

    let ctx = Arc::new(AppContext::with_repositories(
        paths,
        repositories,
        agent.clone(),
    )?);
    ctx.initialize().await?;

    let history_file = TrellisPaths::config_dir()
        .ok()
        .map(|dir| dir.join(HISTORY_FILE));
    let mut shell = shell::Shell::new(ctx, agent, history_file)?;
    shell.run().await?;

    tracing::info!("trellis exited");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "trellis",
            "--data-dir",
            "/tmp/trellis-data",
            "--claude-path",
            "/opt/claude",
        ]);
        let mut config = AppConfig {
            claude_path: Some(PathBuf::from("/usr/bin/claude")),
            model: Some("sonnet".to_string()),
            ..Default::default()
        };
        cli.apply_to(&mut config);

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/trellis-data")));
        assert_eq!(config.claude_path, Some(PathBuf::from("/opt/claude")));
        assert_eq!(config.model.as_deref(), Some("sonnet"));
    }

    #[test]
    fn test_config_kept_without_flags() {
        let cli = Cli::parse_from(["trellis", "--log-level", "debug"]);
        let mut config = AppConfig::default();
        cli.apply_to(&mut config);

        assert_eq!(config, AppConfig::default());
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }
}
