//! Runtime for executing conversations
//!
//! One tokio task per conversation owns the dispatch state; the manager
//! routes submissions to it and gates new conversations on the session.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::ConversationRuntime;
pub use traits::*;

use crate::catalogue::Catalogue;
use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::conversation::{Conversation, ConversationId, Message, MessageId};
use crate::error::{EngineError, EngineResult};
use crate::reply::ReplyComposer;
use crate::state_machine::{ConvContext, Event, TurnPhase};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio_stream::wrappers::BroadcastStream;

/// Title shown for a conversation the user has not written in yet
pub const NEW_CHAT_TITLE: &str = "New Chat";
const TITLE_MAX_CHARS: usize = 40;

/// Type alias for production runtime with concrete implementations
pub type ProductionRuntime = ConversationRuntime<Arc<dyn MessageStore>, Arc<dyn Clock>>;

/// Updates pushed to renderers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConversationUpdate {
    /// A message was appended; renderers should redraw
    Message { message: Message },
    TurnPhase { turn_id: MessageId, phase: TurnPhase },
    StateChange { state: &'static str },
    Error { message: String },
    /// The runtime stopped; no further updates follow
    Closed,
}

/// Sidebar entry for one open conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatSummary {
    pub id: ConversationId,
    pub title: String,
    pub message_count: usize,
    pub created_at: DateTime<Utc>,
    /// Relative label such as "2 hours ago"
    pub timestamp: String,
}

/// Handle to interact with a running conversation
struct ConversationHandle {
    event_tx: mpsc::Sender<Event>,
    updates_tx: broadcast::Sender<ConversationUpdate>,
    created_at: DateTime<Utc>,
}

/// Manager for all conversation runtimes
pub struct RuntimeManager {
    config: EngineConfig,
    catalogue: Catalogue,
    classifier: Classifier,
    store: Arc<dyn MessageStore>,
    session: Arc<dyn SessionProvider>,
    clock: Arc<dyn Clock>,
    runtimes: RwLock<HashMap<ConversationId, ConversationHandle>>,
}

impl RuntimeManager {
    pub fn new(
        config: EngineConfig,
        catalogue: Catalogue,
        store: Arc<dyn MessageStore>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            config,
            catalogue,
            classifier: Classifier::default(),
            store,
            session,
            clock: Arc::new(SystemClock),
            runtimes: RwLock::new(HashMap::new()),
        }
    }

    /// Manager with environment configuration, the built-in catalogue and
    /// an in-memory store
    pub fn from_env(session: Arc<dyn SessionProvider>) -> EngineResult<Self> {
        let config = EngineConfig::from_env();
        let catalogue = Catalogue::builtin()?;
        Ok(Self::new(config, catalogue, Arc::new(InMemoryStore::new()), session))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub async fn is_signed_in(&self) -> bool {
        self.session.has_valid_session().await
    }

    /// Display label of the signed-in user, if the provider exposes one
    pub fn user_label(&self) -> Option<String> {
        self.session.user_label()
    }

    /// Start a new conversation seeded with the greeting
    pub async fn open_conversation(&self) -> EngineResult<ConversationId> {
        if !self.session.has_valid_session().await {
            return Err(EngineError::Unauthenticated);
        }

        let conv_id = ConversationId::new_v4();
        self.store
            .create(&conv_id, Conversation::new(&self.catalogue.greeting))
            .await?;

        let context = ConvContext::new(conv_id.clone())
            .with_classifier(self.classifier.clone())
            .with_reply_delay(self.config.reply_delay);

        let (event_tx, event_rx) = mpsc::channel(32);
        let (updates_tx, _) = broadcast::channel(128);

        let runtime: ProductionRuntime = ConversationRuntime::new(
            context,
            self.store.clone(),
            self.clock.clone(),
            ReplyComposer::from_seed(self.catalogue.clone(), self.config.seed),
            event_rx,
            &event_tx,
            updates_tx.clone(),
        );

        tokio::spawn(runtime.run());

        self.runtimes.write().await.insert(
            conv_id.clone(),
            ConversationHandle {
                event_tx,
                updates_tx,
                created_at: self.clock.now(),
            },
        );

        tracing::info!(conv_id = %conv_id, user = ?self.session.user_label(), "Opened conversation");
        Ok(conv_id)
    }

    /// Submit user text. Blank text is ignored and yields `None`; otherwise
    /// the id of the user message is returned and the reply follows after
    /// the configured delay.
    pub async fn submit(&self, conv_id: &ConversationId, text: &str) -> EngineResult<Option<MessageId>> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        let event_tx = {
            let runtimes = self.runtimes.read().await;
            let handle = runtimes
                .get(conv_id)
                .ok_or_else(|| EngineError::ConversationNotFound(conv_id.clone()))?;
            handle.event_tx.clone()
        };

        let message_id = MessageId::next();
        event_tx
            .send(Event::UserMessage {
                text: text.to_string(),
                message_id,
            })
            .await
            .map_err(|_| EngineError::RuntimeStopped(conv_id.clone()))?;

        Ok(Some(message_id))
    }

    /// Current messages of a conversation, oldest first
    pub async fn messages(&self, conv_id: &ConversationId) -> EngineResult<Vec<Message>> {
        Ok(self.store.snapshot(conv_id).await?)
    }

    /// Subscribe to conversation updates
    pub async fn subscribe(
        &self,
        conv_id: &ConversationId,
    ) -> EngineResult<BroadcastStream<ConversationUpdate>> {
        let runtimes = self.runtimes.read().await;
        let handle = runtimes
            .get(conv_id)
            .ok_or_else(|| EngineError::ConversationNotFound(conv_id.clone()))?;
        Ok(BroadcastStream::new(handle.updates_tx.subscribe()))
    }

    /// Tear down a conversation. Replies still pending are dropped.
    pub async fn close_conversation(&self, conv_id: &ConversationId) -> EngineResult<()> {
        let handle = self
            .runtimes
            .write()
            .await
            .remove(conv_id)
            .ok_or_else(|| EngineError::ConversationNotFound(conv_id.clone()))?;

        // The runtime may already have stopped on its own
        let _ = handle.event_tx.send(Event::Teardown).await;
        self.store.remove(conv_id).await;

        tracing::info!(conv_id = %conv_id, "Closed conversation");
        Ok(())
    }

    /// Open conversations, newest first
    pub async fn list_conversations(&self) -> Vec<ChatSummary> {
        let now = self.clock.now();
        let entries: Vec<(ConversationId, DateTime<Utc>)> = self
            .runtimes
            .read()
            .await
            .iter()
            .map(|(id, handle)| (id.clone(), handle.created_at))
            .collect();

        let mut summaries = Vec::with_capacity(entries.len());
        for (id, created_at) in entries {
            let Ok(stats) = self.store.stats(&id).await else {
                continue;
            };
            summaries.push(ChatSummary {
                title: chat_title(stats.first_user_text.as_deref()),
                message_count: stats.message_count,
                timestamp: relative_label(created_at, now),
                created_at,
                id,
            });
        }

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        summaries
    }

    /// Sign out through the identity provider, then discard every
    /// conversation. Nothing is torn down if the provider fails.
    pub async fn sign_out(&self) -> EngineResult<()> {
        self.session.sign_out().await?;

        let ids: Vec<ConversationId> = self.runtimes.read().await.keys().cloned().collect();
        for id in ids {
            // Already closed concurrently
            let _ = self.close_conversation(&id).await;
        }

        // Conversations created in a shared store without a runtime here
        for id in self.store.ids().await {
            if self.store.remove(&id).await.is_some() {
                tracing::debug!(conv_id = %id, "Discarded stored conversation");
            }
        }

        tracing::info!("Signed out");
        Ok(())
    }
}

/// First user message, shortened for the sidebar
fn chat_title(first_user_text: Option<&str>) -> String {
    let Some(text) = first_user_text.map(str::trim) else {
        return NEW_CHAT_TITLE.to_string();
    };

    if text.chars().count() <= TITLE_MAX_CHARS {
        text.to_string()
    } else {
        let cut: String = text.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}…", cut.trim_end())
    }
}

/// "Just now", "5 minutes ago", "Yesterday", ...
fn relative_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(then);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    match (minutes, hours, days) {
        (m, _, _) if m < 1 => "Just now".to_string(),
        (1, _, _) => "1 minute ago".to_string(),
        (m, 0, _) => format!("{m} minutes ago"),
        (_, 1, 0) => "1 hour ago".to_string(),
        (_, h, 0) => format!("{h} hours ago"),
        (_, _, 1) => "Yesterday".to_string(),
        (_, _, d) if d < 7 => format!("{d} days ago"),
        (_, _, d) if d < 14 => "1 week ago".to_string(),
        (_, _, d) => format!("{} weeks ago", d / 7),
    }
}
