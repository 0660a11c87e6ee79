//! Conversation and message types
//!
//! A conversation is an append-only list of messages. Nothing in the engine
//! edits or removes a message once it has been appended.

use crate::market::{ChartSeries, NewsBundle};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Display label attached to every message the engine creates
pub const JUST_NOW: &str = "Just now";

static LAST_MESSAGE_ID: AtomicU64 = AtomicU64::new(MessageId::GREETING.0);

/// Message identifier, derived from creation time in epoch milliseconds
///
/// Ids are strictly increasing within a process: when two messages are
/// created in the same millisecond the second one takes `last + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    /// Id of the seeded greeting; lower than any time-derived id.
    pub const GREETING: MessageId = MessageId(1);

    /// Allocate the next id from the wall clock
    pub fn next() -> Self {
        let now = u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0);
        let mut current = LAST_MESSAGE_ID.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(current + 1);
            match LAST_MESSAGE_ID.compare_exchange_weak(
                current,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return MessageId(candidate),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of one conversation (one "chat" in the sidebar)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new_v4() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConversationId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

/// A single chat message as handed to renderers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news: Option<NewsBundle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartSeries>,
}

impl Message {
    /// Build a user message from submitted input
    pub fn user(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: Some(text.into()),
            timestamp: JUST_NOW.to_string(),
            news: None,
            chart: None,
        }
    }

    /// Build a plain assistant message
    pub fn assistant(id: MessageId, text: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: Some(text.into()),
            timestamp: JUST_NOW.to_string(),
            news: None,
            chart: None,
        }
    }

    pub fn with_news(mut self, news: NewsBundle) -> Self {
        self.news = Some(news);
        self
    }

    pub fn with_chart(mut self, chart: ChartSeries) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// True when the message carries neither a chart nor news
    pub fn is_plain(&self) -> bool {
        self.news.is_none() && self.chart.is_none()
    }
}

/// Ordered, append-only message history
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversation {
    messages: Vec<Message>,
}

impl Conversation {
    /// Start a conversation seeded with the assistant greeting
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::assistant(MessageId::GREETING, greeting)],
        }
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// First message the user typed, if any
    pub fn first_user_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_user())
    }
}
