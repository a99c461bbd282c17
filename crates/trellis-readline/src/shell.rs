//! The interactive loop.
//!
//! Each line is parsed into a [`Command`] and run against the
//! [`AppContext`] stores. Numbers in commands refer to the most recent
//! listing of that kind (cards, topics, sessions, suggestions).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use rustyline::Editor;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use trellis_application::{AppContext, default_export_file_name};
use trellis_core::feed::DashboardCard;
use trellis_core::session::{MessageRole, Session};
use trellis_core::summary::TopicSuggestion;
use trellis_core::topic::Topic;
use trellis_interaction::ClaudeCodeAgent;

use crate::commands::{self, Command, Selector};
use crate::helper::CliHelper;
use crate::render;

pub struct Shell {
    ctx: Arc<AppContext>,
    agent: Arc<ClaudeCodeAgent>,
    editor: Editor<CliHelper, DefaultHistory>,
    history_file: Option<PathBuf>,
    cards: Vec<DashboardCard>,
    topics: Vec<Topic>,
    sessions: Vec<Session>,
    suggestions: Vec<TopicSuggestion>,
    open_topic: Option<Topic>,
}

enum Flow {
    Continue,
    Exit,
}

impl Shell {
    pub fn new(
        ctx: Arc<AppContext>,
        agent: Arc<ClaudeCodeAgent>,
        history_file: Option<PathBuf>,
    ) -> Result<Self> {
        let mut editor = Editor::new()?;
        editor.set_helper(Some(CliHelper::new()));
        if let Some(path) = &history_file {
            // Missing on first run
            let _ = editor.load_history(path);
        }

        Ok(Self {
            ctx,
            agent,
            editor,
            history_file,
            cards: Vec::new(),
            topics: Vec::new(),
            sessions: Vec::new(),
            suggestions: Vec::new(),
            open_topic: None,
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        render::banner();
        self.check_cli(true).await;
        self.show_dashboard(false).await;

        loop {
            let prompt = if self.in_session().await { "you> " } else { ">> " };
            match self.editor.readline(prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let _ = self.editor.add_history_entry(trimmed);

                    match self.dispatch(commands::parse(trimmed)).await {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        Err(e) => {
                            tracing::error!("Command '{}' failed: {}", trimmed, e);
                            render::error(&format!("Error: {}", e));
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    render::warning("CTRL-C detected. Type 'quit' to exit.");
                }
                Err(ReadlineError::Eof) => {
                    render::success("CTRL-D detected. Exiting...");
                    break;
                }
                Err(err) => {
                    render::error(&format!("Error: {:?}", err));
                    break;
                }
            }
        }

        self.exit().await;
        Ok(())
    }

    async fn dispatch(&mut self, command: Command) -> Result<Flow> {
        match command {
            Command::Help => render::help(),
            Command::Dashboard { refresh } => self.show_dashboard(refresh).await,
            Command::OpenCard(n) => self.open_card(n).await?,
            Command::Topics => {
                self.topics = self.ctx.sessions.load_topics().await?;
                render::topics(&self.topics);
            }
            Command::Topic(selector) => self.show_topic(selector).await?,
            Command::RefreshSummary => self.refresh_summary().await?,
            Command::TrySuggestion(n) => self.try_suggestion(n).await?,
            Command::CreateTopic { name, category } => {
                let topic = self.ctx.knowledge.create_topic(&name, category).await?;
                self.ctx.sessions.load_topics().await?;
                self.ctx.dashboard.invalidate().await;
                render::success(&format!("Topic '{}' is ready.", topic.label()));
            }
            Command::DeleteTopic(selector) => self.delete_topic(selector).await?,
            Command::New(selector) => {
                let topic_id = match selector {
                    Some(selector) => Some(self.select_topic(&selector).await?.id),
                    None => None,
                };
                self.start_session(topic_id).await;
                render::info("New session. Ask anything.");
            }
            Command::Sessions => self.list_sessions().await?,
            Command::Resume(n) => self.resume(n).await?,
            Command::DeleteSession(n) => {
                let session = pick(&self.sessions, n, "session")?.clone();
                self.ctx.sessions.delete_session(&session.id).await?;
                self.sessions.retain(|s| s.id != session.id);
                render::success("Session deleted.");
            }
            Command::End => self.end_session().await,
            Command::History => {
                let state = self.ctx.sessions.snapshot().await;
                if state.messages.is_empty() {
                    render::info("No messages in this session yet.");
                }
                state.messages.iter().for_each(render::message);
            }
            Command::Context => self.show_prompt_context().await,
            Command::Demo => self.demo().await?,
            Command::Style(None) => {
                render::teaching_style(&self.ctx.settings.teaching_style().await);
            }
            Command::Style(Some(update)) => {
                let settings = self.ctx.settings.update_teaching_style(update).await?;
                render::teaching_style(&settings.teaching_style);
            }
            Command::CliPath(path) => {
                let settings = self.ctx.settings.set_cli_path(path).await?;
                match settings.cli_path {
                    Some(path) => render::success(&format!("CLI path set to {}.", path)),
                    None => render::success("CLI path cleared."),
                }
                render::info("The new path is used from the next start.");
            }
            Command::Status => self.check_cli(false).await,
            Command::Stats => render::stats(&self.ctx.knowledge.knowledge_stats().await?),
            Command::Export(path) => {
                let path = path
                    .unwrap_or_else(|| PathBuf::from(default_export_file_name(Utc::now())));
                let data = self.ctx.data_transfer.export_to_file(&path).await?;
                render::success(&format!(
                    "Exported {} topics and {} sessions to {}.",
                    data.topics.len(),
                    data.sessions.len(),
                    path.display()
                ));
            }
            Command::Import(path) => self.import(path).await?,
            Command::ClearAll => self.clear_all().await?,
            Command::Quit => return Ok(Flow::Exit),
            Command::Say(text) => self.say(&text).await?,
            Command::Usage(usage) => render::warning(&format!("Usage: {}", usage)),
            Command::Unknown(name) => {
                render::warning(&format!("Unknown command {}. Try /help.", name));
            }
        }
        Ok(Flow::Continue)
    }

    async fn in_session(&self) -> bool {
        self.ctx.sessions.snapshot().await.current_session.is_some()
    }

    /// Probes the CLI; on first start a healthy CLI completes onboarding.
    async fn check_cli(&self, startup: bool) {
        let status = self.agent.check_status().await;
        let ready = status.installed && status.authenticated;

        if startup {
            let onboarded = match self.ctx.settings.settings().await {
                Ok(settings) => settings.onboarding_complete,
                Err(e) => {
                    tracing::warn!("Could not read settings: {}", e);
                    false
                }
            };
            if ready && !onboarded {
                if let Err(e) = self.ctx.settings.complete_onboarding().await {
                    tracing::warn!("Could not record onboarding: {}", e);
                }
            }
            if !ready {
                render::onboarding(Some(&status));
            }
            return;
        }

        render::status(&status);
        if ready {
            render::success("Claude CLI is ready.");
        } else {
            render::onboarding(Some(&status));
        }
    }

    async fn show_dashboard(&mut self, refresh: bool) {
        render::info("Preparing your dashboard...");
        let result = if refresh {
            self.ctx.dashboard.refresh_feed().await
        } else {
            self.ctx.dashboard.load_feed().await
        };
        if let Err(e) = result {
            tracing::error!("Failed to load feed: {}", e);
        }

        let state = self.ctx.dashboard.snapshot().await;
        self.cards = state.cards;
        render::cards(&self.cards);
        if let Some(error) = state.error {
            render::warning(&error);
        }
    }

    async fn open_card(&mut self, n: usize) -> Result<()> {
        let card = pick(&self.cards, n, "card")?.clone();
        self.start_session(card.topic_id.clone()).await;
        render::info(&format!("Starting: {}", card.title));
        if let Some(prompt) = card.suggested_prompt {
            self.say(&prompt).await?;
        }
        Ok(())
    }

    async fn select_topic(&mut self, selector: &Selector) -> Result<Topic> {
        match selector {
            Selector::Index(n) => {
                if self.topics.is_empty() {
                    self.topics = self.ctx.sessions.load_topics().await?;
                }
                Ok(pick(&self.topics, *n, "topic")?.clone())
            }
            Selector::Name(name) => self
                .ctx
                .repositories
                .topics
                .find_by_name(name)
                .await?
                .ok_or_else(|| anyhow::anyhow!("No topic named '{}'", name)),
        }
    }

    async fn show_topic(&mut self, selector: Selector) -> Result<()> {
        let topic = self.select_topic(&selector).await?;
        let Some(data) = self.ctx.knowledge.get_topic_with_concepts(&topic.id).await? else {
            anyhow::bail!("Topic not found");
        };
        let related = self.ctx.knowledge.get_related_topics(&topic.id).await?;
        render::topic_header(&data.topic, &data.concepts, &related);

        render::info("Summarising...");
        self.ctx.summaries.load_summary(&topic.id).await?;
        self.open_topic = Some(data.topic);
        self.show_summary(&topic.id).await;
        Ok(())
    }

    async fn refresh_summary(&mut self) -> Result<()> {
        let Some(topic) = self.open_topic.clone() else {
            render::warning("Open a topic first with /topic.");
            return Ok(());
        };
        render::info("Summarising...");
        self.ctx.summaries.regenerate_summary(&topic.id).await?;
        self.show_summary(&topic.id).await;
        Ok(())
    }

    async fn show_summary(&mut self, topic_id: &str) {
        let state = self.ctx.summaries.snapshot().await;
        if let Some(error) = &state.error {
            render::warning(error);
        }
        match state.summaries.get(topic_id) {
            Some(summary) => {
                render::summary(summary);
                self.suggestions = summary.follow_up_suggestions.clone();
            }
            None => self.suggestions.clear(),
        }
    }

    async fn try_suggestion(&mut self, n: usize) -> Result<()> {
        let suggestion = pick(&self.suggestions, n, "suggestion")?.clone();
        let topic_id = self.open_topic.as_ref().map(|t| t.id.clone());
        self.start_session(topic_id).await;
        render::info(&format!("Starting: {}", suggestion.title));
        self.say(&suggestion.suggested_prompt).await
    }

    async fn delete_topic(&mut self, selector: Selector) -> Result<()> {
        let topic = self.select_topic(&selector).await?;
        if !self.confirm(&format!(
            "Delete '{}' with all its sessions and concepts? [y/N] ",
            topic.name
        ))? {
            return Ok(());
        }

        self.ctx.summaries.clear_summary(&topic.id).await;
        self.ctx.knowledge.delete_topic(&topic.id).await?;
        self.topics = self.ctx.sessions.load_topics().await?;
        if self.open_topic.as_ref().is_some_and(|t| t.id == topic.id) {
            self.open_topic = None;
            self.suggestions.clear();
            self.sessions.clear();
        }
        self.ctx.dashboard.invalidate().await;
        render::success(&format!("Deleted '{}'.", topic.name));
        Ok(())
    }

    async fn list_sessions(&mut self) -> Result<()> {
        let Some(topic) = &self.open_topic else {
            render::warning("Open a topic first with /topic.");
            return Ok(());
        };
        self.sessions = self.ctx.sessions.load_sessions_for_topic(&topic.id).await?;
        render::sessions(&self.sessions);
        Ok(())
    }

    async fn resume(&mut self, n: usize) -> Result<()> {
        let session = pick(&self.sessions, n, "session")?.clone();
        self.end_session().await;
        self.ctx.sessions.load_session(&session.id).await?;
        let state = self.ctx.sessions.snapshot().await;
        state.messages.iter().for_each(render::message);
        render::info("Session resumed.");
        Ok(())
    }

    /// Ends whatever session is active and starts a new draft.
    async fn start_session(&self, topic_id: Option<String>) {
        self.end_session().await;
        self.ctx.sessions.start_session(topic_id).await;
    }

    /// Ends the current session. Extraction runs in the background and
    /// refreshes the dashboard and the topic's summary when it lands.
    async fn end_session(&self) {
        let Some(handle) = self.ctx.sessions.end_session().await else {
            return;
        };
        render::info("Session ended. Extracting what you learned in the background...");

        let dashboard = self.ctx.dashboard.clone();
        let summaries = self.ctx.summaries.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(Ok(Some(topic))) => {
                    tracing::info!("Session knowledge saved to '{}'", topic.name);
                    dashboard.invalidate().await;
                    dashboard.refresh_feed_in_background();
                    summaries.regenerate_summary_in_background(&topic.id);
                }
                Ok(Ok(None)) => tracing::debug!("Nothing extracted from session"),
                Ok(Err(e)) => tracing::error!("Knowledge extraction failed: {}", e),
                Err(e) => tracing::error!("Extraction task panicked: {}", e),
            }
        });
    }

    async fn say(&mut self, text: &str) -> Result<()> {
        if !self.in_session().await {
            self.ctx.sessions.start_session(None).await;
        }

        println!();
        render::info("Thinking...");
        self.ctx.sessions.send_message(text).await?;

        let state = self.ctx.sessions.snapshot().await;
        if state.cli_not_found {
            render::onboarding(None);
        } else if let Some(error) = &state.error {
            render::error(error);
        } else if let Some(reply) = state
            .messages
            .last()
            .filter(|m| m.role == MessageRole::Assistant)
        {
            render::message(reply);
        }
        self.ctx.sessions.clear_error().await;
        Ok(())
    }

    async fn show_prompt_context(&self) {
        let state = self.ctx.sessions.snapshot().await;
        let context = state
            .messages
            .iter()
            .rev()
            .find_map(|m| m.prompt_context.as_ref());
        match context {
            Some(context) => {
                render::info("System prompt:");
                println!("{}", context.system_prompt);
                if let Some(knowledge) = &context.knowledge_context {
                    render::info("Knowledge context:");
                    println!("{}", knowledge);
                }
            }
            None => render::info("No reply in this session yet."),
        }
    }

    async fn demo(&self) -> Result<()> {
        let messages = self.ctx.sessions.snapshot().await.messages;
        render::info("Building a demo...");
        let demo = self.ctx.demos.generate_demo(&messages).await;
        if demo.cli_not_found {
            render::onboarding(None);
            return Ok(());
        }
        if !demo.success {
            render::error(demo.error.as_deref().unwrap_or("Demo generation failed"));
            return Ok(());
        }

        let path = self.ctx.demos.save_demo(&demo).await?;
        render::success(&format!(
            "'{}' saved to {}",
            demo.title.as_deref().unwrap_or_default(),
            path.display()
        ));
        Ok(())
    }

    async fn import(&mut self, path: PathBuf) -> Result<()> {
        if !self.confirm("Importing replaces all current data. Continue? [y/N] ")? {
            return Ok(());
        }
        self.end_session().await;
        self.ctx.pending.wait_until_idle().await;

        let data = self.ctx.import_from_file(&path).await?;
        self.forget_listings();
        render::success(&format!(
            "Imported {} topics, {} concepts, {} sessions and {} messages.",
            data.topics.len(),
            data.concepts.len(),
            data.sessions.len(),
            data.messages.len()
        ));
        Ok(())
    }

    async fn clear_all(&mut self) -> Result<()> {
        if !self.confirm("Delete all topics, concepts and sessions? [y/N] ")? {
            return Ok(());
        }
        self.end_session().await;
        self.ctx.pending.wait_until_idle().await;

        self.ctx.clear_all_knowledge().await?;
        self.forget_listings();
        render::success("All knowledge cleared.");
        Ok(())
    }

    fn forget_listings(&mut self) {
        self.cards.clear();
        self.topics.clear();
        self.sessions.clear();
        self.suggestions.clear();
        self.open_topic = None;
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        match self.editor.readline(question) {
            Ok(answer) => Ok(matches!(answer.trim(), "y" | "Y" | "yes")),
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Ends the active session and waits for in-flight sends and
    /// extractions before returning.
    async fn exit(&mut self) {
        self.end_session().await;
        if self.ctx.pending.has_pending_tasks() {
            render::warning(&format!(
                "Waiting for {} pending task(s) to finish...",
                self.ctx.pending.active_count()
            ));
        }
        self.ctx.shutdown().await;

        if let Some(path) = &self.history_file {
            if let Err(e) = self.editor.save_history(path) {
                tracing::debug!("Could not save history: {}", e);
            }
        }
        render::success("Goodbye!");
    }
}

/// The `n`th (1-based) item of the last listing.
fn pick<'a, T>(items: &'a [T], n: usize, what: &str) -> Result<&'a T> {
    n.checked_sub(1)
        .and_then(|i| items.get(i))
        .ok_or_else(|| anyhow::anyhow!("No {} number {} in the last listing", what, n))
}
