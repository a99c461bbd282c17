//! Chat session lifecycle.
//!
//! A session starts as an in-memory draft and is written to storage only
//! once its first message gets a reply, so abandoned drafts never show up in
//! other views. Ending a session hands its transcript to the knowledge
//! store for extraction.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use trellis_core::agent::CompletionAgent;
use trellis_core::session::{Message, Session};
use trellis_core::topic::Topic;
use trellis_core::{Result, TrellisError};
use trellis_interaction::generation::knowledge_extraction::MIN_MESSAGES_FOR_EXTRACTION;
use trellis_interaction::generation::{ChatReply, ChatService, TopicIdentifier};
use trellis_interaction::{PromptLibrary, build_system_prompt};

use crate::context::Repositories;
use crate::knowledge_store::KnowledgeStore;
use crate::pending::PendingTasks;
use crate::settings_store::SettingsStore;

pub const NO_ACTIVE_SESSION: &str = "No active session";
pub const SESSION_NOT_FOUND: &str = "Session not found";

/// What the chat view renders.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    pub current_session: Option<Session>,
    /// The current session has not been written to storage yet
    pub is_draft: bool,
    pub messages: Vec<Message>,
    /// Most recently explored first
    pub topics: Vec<Topic>,
    /// Sessions of the topic last loaded with `load_sessions_for_topic`
    pub topic_sessions: Vec<Session>,
    pub is_loading: bool,
    /// The reply being delivered, before it becomes a message
    pub streaming_content: String,
    pub error: Option<String>,
    /// The CLI could not be found; the shell should show onboarding
    pub cli_not_found: bool,
}

impl SessionState {
    fn is_current(&self, session_id: &str) -> bool {
        self.current_session
            .as_ref()
            .is_some_and(|session| session.id == session_id)
    }
}

pub struct SessionStore {
    state: Arc<RwLock<SessionState>>,
    repositories: Repositories,
    chat: ChatService,
    identifier: Arc<TopicIdentifier>,
    knowledge: Arc<KnowledgeStore>,
    settings: Arc<SettingsStore>,
    pending: PendingTasks,
}

impl SessionStore {
    pub fn new(
        repositories: Repositories,
        agent: Arc<dyn CompletionAgent>,
        prompts: Arc<PromptLibrary>,
        knowledge: Arc<KnowledgeStore>,
        settings: Arc<SettingsStore>,
        pending: PendingTasks,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState::default())),
            repositories,
            chat: ChatService::new(agent.clone()),
            identifier: Arc::new(TopicIdentifier::new(agent, prompts)),
            knowledge,
            settings,
            pending,
        }
    }

    pub async fn snapshot(&self) -> SessionState {
        self.state.read().await.clone()
    }

    pub async fn clear_error(&self) {
        let mut state = self.state.write().await;
        state.error = None;
        state.cli_not_found = false;
    }

    pub async fn load_topics(&self) -> Result<Vec<Topic>> {
        let topics = self.repositories.topics.list_all().await?;
        self.state.write().await.topics = topics.clone();
        Ok(topics)
    }

    /// Sessions of a topic, most recent first.
    pub async fn load_sessions_for_topic(&self, topic_id: &str) -> Result<Vec<Session>> {
        let sessions = self.repositories.sessions.list_by_topic(topic_id).await?;
        self.state.write().await.topic_sessions = sessions.clone();
        Ok(sessions)
    }

    /// Starts a draft session. Nothing is written until the first reply.
    pub async fn start_session(&self, topic_id: Option<String>) -> Session {
        let session = Session::new(topic_id);
        let mut state = self.state.write().await;
        state.current_session = Some(session.clone());
        state.is_draft = true;
        state.messages.clear();
        state.streaming_content.clear();
        state.error = None;
        state.cli_not_found = false;
        tracing::debug!("Started draft session {}", session.id);
        session
    }

    /// Makes a stored session current, with its messages in order.
    pub async fn load_session(&self, session_id: &str) -> Result<Session> {
        let Some(session) = self.repositories.sessions.find_by_id(session_id).await? else {
            self.state.write().await.error = Some(SESSION_NOT_FOUND.to_string());
            return Err(TrellisError::not_found("session", session_id));
        };
        let messages = self
            .repositories
            .messages
            .list_by_session(session_id)
            .await?;

        let mut state = self.state.write().await;
        state.current_session = Some(session.clone());
        state.is_draft = false;
        state.messages = messages;
        state.streaming_content.clear();
        state.error = None;
        Ok(session)
    }

    /// Sends a user message in the current session and stores the reply.
    ///
    /// Agent failures are reported through `error` / `cli_not_found` on the
    /// state; only storage failures are returned as errors.
    pub async fn send_message(&self, content: &str) -> Result<()> {
        let content = content.trim();
        if content.is_empty() {
            return Ok(());
        }

        let _guard = self.pending.register();
        let (session, is_draft, history) = {
            let mut state = self.state.write().await;
            let Some(session) = state.current_session.clone() else {
                state.error = Some(NO_ACTIVE_SESSION.to_string());
                return Ok(());
            };
            state.is_loading = true;
            state.error = None;
            state.cli_not_found = false;
            state.streaming_content.clear();
            (session, state.is_draft, state.messages.clone())
        };

        let result = self.exchange(session, is_draft, history, content).await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        state.streaming_content.clear();
        if let Err(e) = &result {
            tracing::error!("Failed to send message: {}", e);
            state.error = Some(e.to_string());
        }
        result
    }

    async fn exchange(
        &self,
        session: Session,
        is_draft: bool,
        mut history: Vec<Message>,
        content: &str,
    ) -> Result<()> {
        // A draft keeps its messages in memory until a reply arrives.
        let user_message = Message::user(&session.id, content);
        if !is_draft {
            self.repositories.messages.save(&user_message).await?;
        }
        history.push(user_message.clone());
        {
            let mut state = self.state.write().await;
            if state.is_current(&session.id) {
                state.messages.push(user_message);
            }
        }

        let style = self.settings.teaching_style().await;
        let system_prompt = build_system_prompt(Some(&style));
        let knowledge_context = self
            .knowledge
            .get_knowledge_context()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Knowledge context unavailable: {}", e);
                String::new()
            });

        let outcome = self
            .chat
            .send(&history, &system_prompt, Some(knowledge_context.as_str()))
            .await;

        let reply = match outcome.reply {
            ChatReply::Text(reply) => reply,
            ChatReply::CliNotFound(error) => {
                tracing::warn!("CLI not found: {}", error);
                let mut state = self.state.write().await;
                state.cli_not_found = true;
                state.error = Some(error);
                return Ok(());
            }
            ChatReply::Error(error) => {
                tracing::warn!("Chat failed: {}", error);
                self.state.write().await.error = Some(error);
                return Ok(());
            }
        };

        self.state.write().await.streaming_content = reply.clone();
        if is_draft {
            self.persist_draft(&session, &history).await?;
        }
        let mut assistant_message = Message::assistant(&session.id, reply);
        if let Some(prompt_context) = outcome.prompt_context {
            assistant_message = assistant_message.with_prompt_context(prompt_context);
        }
        self.repositories.messages.save(&assistant_message).await?;

        // Re-read so a topic assigned in the background is not lost.
        let mut stored = self
            .repositories
            .sessions
            .find_by_id(&session.id)
            .await?
            .unwrap_or(session);
        stored.last_message_at = Utc::now();
        self.repositories.sessions.save(&stored).await?;

        {
            let mut state = self.state.write().await;
            if state.is_current(&stored.id) {
                state.messages.push(assistant_message);
                state.current_session = Some(stored.clone());
            }
        }

        if is_draft && stored.topic_id.is_none() {
            let first_message = history
                .first()
                .map(|m| m.content.clone())
                .unwrap_or_else(|| content.to_string());
            self.spawn_topic_identification(stored.id.clone(), first_message);
        }
        Ok(())
    }

    /// Writes a draft session and the messages it has gathered so far.
    async fn persist_draft(&self, session: &Session, messages: &[Message]) -> Result<()> {
        self.repositories.sessions.save(session).await?;
        for message in messages {
            self.repositories.messages.save(message).await?;
        }
        let mut state = self.state.write().await;
        if state.is_current(&session.id) {
            state.is_draft = false;
        }
        tracing::info!("Persisted session {}", session.id);
        Ok(())
    }

    fn spawn_topic_identification(&self, session_id: String, first_message: String) {
        let guard = self.pending.register();
        let identifier = self.identifier.clone();
        let repositories = self.repositories.clone();
        let state = self.state.clone();

        tokio::spawn(async move {
            let _guard = guard;
            match identify_session_topic(&identifier, &repositories, &session_id, &first_message)
                .await
            {
                Ok(Some(topic_id)) => {
                    let mut state = state.write().await;
                    if let Some(current) = state.current_session.as_mut() {
                        if current.id == session_id {
                            current.assign_topic(&topic_id);
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!("Topic identification failed: {}", e),
            }
        });
    }

    /// Ends the current session.
    ///
    /// Drafts and sessions with fewer than two messages are dropped without
    /// any write. Otherwise extraction runs in the background; the returned
    /// handle resolves to the topic it touched.
    pub async fn end_session(&self) -> Option<JoinHandle<Result<Option<Topic>>>> {
        let (session, is_draft, messages) = {
            let mut state = self.state.write().await;
            let session = state.current_session.take()?;
            let messages = std::mem::take(&mut state.messages);
            let is_draft = std::mem::replace(&mut state.is_draft, false);
            state.streaming_content.clear();
            state.error = None;
            (session, is_draft, messages)
        };

        if is_draft || messages.len() < MIN_MESSAGES_FOR_EXTRACTION {
            tracing::debug!("Discarding session {} without extraction", session.id);
            return None;
        }

        let guard = self.pending.register();
        let knowledge = self.knowledge.clone();
        let repositories = self.repositories.clone();
        Some(tokio::spawn(async move {
            let _guard = guard;
            let topic_id = match repositories.sessions.find_by_id(&session.id).await {
                Ok(stored) => stored.and_then(|s| s.topic_id).or(session.topic_id),
                Err(e) => {
                    tracing::warn!("Could not re-read session {}: {}", session.id, e);
                    session.topic_id
                }
            };

            let result = match topic_id {
                Some(topic_id) => {
                    knowledge
                        .update_topic_from_session(&topic_id, &session.id, &messages)
                        .await
                }
                None => {
                    knowledge
                        .extract_and_save_knowledge(&messages, &session.id)
                        .await
                }
            };
            if let Err(e) = &result {
                tracing::error!("Knowledge extraction for session {} failed: {}", session.id, e);
            }
            result
        }))
    }

    /// Deletes a session with its messages and unlinks it from its topic.
    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let session = self.repositories.sessions.find_by_id(session_id).await?;
        self.repositories.messages.delete_by_session(session_id).await?;
        self.repositories.sessions.delete(session_id).await?;

        if let Some(topic_id) = session.and_then(|s| s.topic_id) {
            if let Some(mut topic) = self.repositories.topics.find_by_id(&topic_id).await? {
                let before = topic.session_ids.len();
                topic.session_ids.retain(|id| id != session_id);
                if topic.session_ids.len() != before {
                    self.repositories.topics.save(&topic).await?;
                }
            }
        }

        let mut state = self.state.write().await;
        state.topic_sessions.retain(|s| s.id != session_id);
        if state.is_current(session_id) {
            state.current_session = None;
            state.is_draft = false;
            state.messages.clear();
        }
        Ok(())
    }
}

/// Classifies a session from its first message and links it to the
/// matching existing topic. Returns the assigned topic id.
///
/// An exact (case-insensitive) name match wins; otherwise the agent is
/// asked to match against the known topics. A session that already has a
/// topic is never reassigned.
pub async fn identify_session_topic(
    identifier: &TopicIdentifier,
    repositories: &Repositories,
    session_id: &str,
    first_message: &str,
) -> Result<Option<String>> {
    let Some(identified) = identifier.identify(first_message).await else {
        return Ok(None);
    };

    let topics = repositories.topics.list_all().await?;
    let topic_id = match topics.iter().find(|t| t.has_name(&identified.topic_name)) {
        Some(topic) => topic.id.clone(),
        None => match identifier.find_matching_topic(&identified, &topics).await {
            Some(matched) => matched.topic_id,
            None => return Ok(None),
        },
    };

    let Some(mut session) = repositories.sessions.find_by_id(session_id).await? else {
        return Ok(None);
    };
    if !session.assign_topic(&topic_id) {
        return Ok(None);
    }
    repositories.sessions.save(&session).await?;

    if let Some(mut topic) = repositories.topics.find_by_id(&topic_id).await? {
        if topic.link_session(session_id) {
            repositories.topics.save(&topic).await?;
        }
    }
    tracing::info!("Session {} identified as topic {}", session_id, topic_id);
    Ok(Some(topic_id))
}
