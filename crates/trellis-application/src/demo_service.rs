//! Interactive HTML demos for the current conversation.

use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use trellis_core::agent::CompletionAgent;
use trellis_core::session::Message;
use trellis_core::{Result, TrellisError};
use trellis_interaction::PromptLibrary;
use trellis_interaction::generation::{DemoGenerator, DemoResult};

pub struct DemoService {
    generator: DemoGenerator,
    demos_dir: PathBuf,
}

impl DemoService {
    pub fn new(
        agent: Arc<dyn CompletionAgent>,
        prompts: Arc<PromptLibrary>,
        demos_dir: PathBuf,
    ) -> Self {
        Self {
            generator: DemoGenerator::new(agent, prompts),
            demos_dir,
        }
    }

    pub async fn generate_demo(&self, messages: &[Message]) -> DemoResult {
        self.generator.generate(messages).await
    }

    /// Writes a successful demo under the demos directory and returns its
    /// path.
    pub async fn save_demo(&self, demo: &DemoResult) -> Result<PathBuf> {
        let html = demo
            .html
            .as_deref()
            .filter(|_| demo.success)
            .ok_or_else(|| TrellisError::internal("No demo to save"))?;

        tokio::fs::create_dir_all(&self.demos_dir).await?;
        let title = demo.title.as_deref().unwrap_or("demo");
        let file_name = format!("{}-{}.html", slug(title), Utc::now().format("%Y%m%d-%H%M%S"));
        let path = self.demos_dir.join(file_name);
        tokio::fs::write(&path, html).await?;
        tracing::info!("Saved demo to {}", path.display());
        Ok(path)
    }
}

/// Lowercase ASCII words joined by `-`.
fn slug(title: &str) -> String {
    let slug = title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(|word| word.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "demo".to_string()
    } else {
        slug
    }
}
