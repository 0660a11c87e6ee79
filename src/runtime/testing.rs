//! Mock implementations for testing
//!
//! These mocks enable runtime tests without an identity service or a real
//! calendar.

use super::traits::*;
use crate::conversation::{Conversation, ConversationId, Message};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Recording Store
// ============================================================================

/// One `append` call seen by a `RecordingStore`
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedAppend {
    pub conv_id: ConversationId,
    pub message: Message,
    /// Whether the conversation still existed
    pub stored: bool,
}

/// In-memory store that also records every append attempt, including the
/// ones dropped because the conversation was gone
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: InMemoryStore,
    appends: Arc<Mutex<Vec<RecordedAppend>>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn appends(&self) -> Vec<RecordedAppend> {
        self.appends.lock().unwrap().clone()
    }

    /// Append attempts that found no conversation
    pub fn dropped(&self) -> Vec<RecordedAppend> {
        self.appends().into_iter().filter(|a| !a.stored).collect()
    }
}

#[async_trait]
impl MessageStore for RecordingStore {
    async fn create(&self, conv_id: &ConversationId, conversation: Conversation) -> Result<(), StoreError> {
        self.inner.create(conv_id, conversation).await
    }

    async fn append(&self, conv_id: &ConversationId, message: Message) -> Result<bool, StoreError> {
        let stored = self.inner.append(conv_id, message.clone()).await?;
        self.appends.lock().unwrap().push(RecordedAppend {
            conv_id: conv_id.clone(),
            message,
            stored,
        });
        Ok(stored)
    }

    async fn snapshot(&self, conv_id: &ConversationId) -> Result<Vec<Message>, StoreError> {
        self.inner.snapshot(conv_id).await
    }

    async fn stats(&self, conv_id: &ConversationId) -> Result<ConversationStats, StoreError> {
        self.inner.stats(conv_id).await
    }

    async fn remove(&self, conv_id: &ConversationId) -> Option<Conversation> {
        self.inner.remove(conv_id).await
    }

    async fn ids(&self) -> Vec<ConversationId> {
        self.inner.ids().await
    }
}

// ============================================================================
// Mock Session Provider
// ============================================================================

/// Session provider with a switchable session and a sign-out counter
pub struct MockSessionProvider {
    valid: AtomicBool,
    user: Option<String>,
    fail_sign_out: bool,
    sign_outs: AtomicUsize,
}

impl MockSessionProvider {
    pub fn signed_in(user: impl Into<String>) -> Self {
        Self {
            valid: AtomicBool::new(true),
            user: Some(user.into()),
            fail_sign_out: false,
            sign_outs: AtomicUsize::new(0),
        }
    }

    pub fn signed_out() -> Self {
        Self {
            valid: AtomicBool::new(false),
            user: None,
            fail_sign_out: false,
            sign_outs: AtomicUsize::new(0),
        }
    }

    /// Make `sign_out` fail
    pub fn failing_sign_out(mut self) -> Self {
        self.fail_sign_out = true;
        self
    }

    pub fn sign_out_count(&self) -> usize {
        self.sign_outs.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for MockSessionProvider {
    async fn has_valid_session(&self) -> bool {
        self.valid.load(Ordering::SeqCst)
    }

    fn user_label(&self) -> Option<String> {
        self.user.clone()
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(SessionError::SignOutFailed("identity service unavailable".to_string()));
        }
        self.valid.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// Fixed Clock
// ============================================================================

/// Clock frozen at a configurable instant
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.now.lock().unwrap().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}
