//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::conversation::{Conversation, ConversationId, Message};
use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Conversation already exists: {0}")]
    AlreadyExists(ConversationId),
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Sign-out failed: {0}")]
    SignOutFailed(String),
}

/// Listing view of a stored conversation, computed without copying its
/// messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationStats {
    /// Text of the first user message, if the user has written anything
    pub first_user_text: Option<String>,
    pub message_count: usize,
}

impl ConversationStats {
    pub fn of(conversation: &Conversation) -> Self {
        Self {
            first_user_text: conversation
                .first_user_message()
                .and_then(|m| m.content.clone()),
            message_count: conversation.len(),
        }
    }
}

/// Storage for conversation messages
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Register a new conversation
    async fn create(&self, conv_id: &ConversationId, conversation: Conversation) -> Result<(), StoreError>;

    /// Append a message. Returns `false` when the conversation is gone,
    /// in which case nothing is stored.
    async fn append(&self, conv_id: &ConversationId, message: Message) -> Result<bool, StoreError>;

    /// Copy of the conversation's messages in order
    async fn snapshot(&self, conv_id: &ConversationId) -> Result<Vec<Message>, StoreError>;

    /// Title source and size of a conversation
    async fn stats(&self, conv_id: &ConversationId) -> Result<ConversationStats, StoreError>;

    /// Discard a conversation
    async fn remove(&self, conv_id: &ConversationId) -> Option<Conversation>;

    /// Ids of every stored conversation, in no particular order
    async fn ids(&self) -> Vec<ConversationId>;
}

/// External identity provider. Authentication itself lives elsewhere; the
/// engine only asks whether a session exists.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    async fn has_valid_session(&self) -> bool;

    /// Display-only user identifier
    fn user_label(&self) -> Option<String>;

    async fn sign_out(&self) -> Result<(), SessionError>;
}

/// Source of "today" for chart dates and "now" for chat summaries
pub trait Clock: Send + Sync {
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: MessageStore + ?Sized> MessageStore for Arc<T> {
    async fn create(&self, conv_id: &ConversationId, conversation: Conversation) -> Result<(), StoreError> {
        (**self).create(conv_id, conversation).await
    }

    async fn append(&self, conv_id: &ConversationId, message: Message) -> Result<bool, StoreError> {
        (**self).append(conv_id, message).await
    }

    async fn snapshot(&self, conv_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        (**self).snapshot(conv_id).await
    }

    async fn stats(&self, conv_id: &ConversationId) -> Result<ConversationStats, StoreError> {
        (**self).stats(conv_id).await
    }

    async fn remove(&self, conv_id: &ConversationId) -> Option<Conversation> {
        (**self).remove(conv_id).await
    }

    async fn ids(&self) -> Vec<ConversationId> {
        (**self).ids().await
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

/// Process-local conversation store
#[derive(Clone, Default)]
pub struct InMemoryStore {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.conversations.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.conversations.read().await.is_empty()
    }
}

#[async_trait]
impl MessageStore for InMemoryStore {
    async fn create(&self, conv_id: &ConversationId, conversation: Conversation) -> Result<(), StoreError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(conv_id) {
            return Err(StoreError::AlreadyExists(conv_id.clone()));
        }
        conversations.insert(conv_id.clone(), conversation);
        Ok(())
    }

    async fn append(&self, conv_id: &ConversationId, message: Message) -> Result<bool, StoreError> {
        let mut conversations = self.conversations.write().await;
        match conversations.get_mut(conv_id) {
            Some(conversation) => {
                conversation.append(message);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn snapshot(&self, conv_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        self.conversations
            .read()
            .await
            .get(conv_id)
            .map(|c| c.messages().to_vec())
            .ok_or_else(|| StoreError::NotFound(conv_id.clone()))
    }

    async fn stats(&self, conv_id: &ConversationId) -> Result<ConversationStats, StoreError> {
        self.conversations
            .read()
            .await
            .get(conv_id)
            .map(ConversationStats::of)
            .ok_or_else(|| StoreError::NotFound(conv_id.clone()))
    }

    async fn remove(&self, conv_id: &ConversationId) -> Option<Conversation> {
        self.conversations.write().await.remove(conv_id)
    }

    async fn ids(&self) -> Vec<ConversationId> {
        self.conversations.read().await.keys().cloned().collect()
    }
}

/// Session provider for hosts without an identity service
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousSession;

#[async_trait]
impl SessionProvider for AnonymousSession {
    async fn has_valid_session(&self) -> bool {
        true
    }

    fn user_label(&self) -> Option<String> {
        None
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        Ok(())
    }
}

/// Wall clock; chart dates use the local calendar day
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
