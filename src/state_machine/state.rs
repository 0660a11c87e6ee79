//! Conversation state types

use crate::classifier::{Category, Classifier};
use crate::config::DEFAULT_REPLY_DELAY;
use crate::conversation::{ConversationId, Message, MessageId};
use serde::Serialize;
use std::time::Duration;

/// Phase of a single user turn
///
/// A conversation with no turn in flight is `ConvState::Idle`; turns only
/// exist from classification until delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    Classifying,
    Generating,
    Scheduled,
    Delivered,
}

/// A turn whose reply has not been delivered yet
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PendingTurn {
    pub turn_id: MessageId,
    pub category: Category,
    pub phase: TurnPhase,
    /// Set once the reply has been generated
    pub reply: Option<Message>,
    /// The delivery timer has fired
    pub due: bool,
}

impl PendingTurn {
    pub fn generating(turn_id: MessageId, category: Category) -> Self {
        Self {
            turn_id,
            category,
            phase: TurnPhase::Generating,
            reply: None,
            due: false,
        }
    }

    pub fn is_deliverable(&self) -> bool {
        self.due && self.reply.is_some()
    }
}

/// Conversation state
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConvState {
    /// No reply in flight
    #[default]
    Idle,

    /// One or more turns in flight, in submission order
    Responding { turns: Vec<PendingTurn> },

    /// Torn down; later events are dropped
    Closed,
}

impl ConvState {
    pub fn pending_turns(&self) -> &[PendingTurn] {
        match self {
            ConvState::Responding { turns } => turns,
            ConvState::Idle | ConvState::Closed => &[],
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ConvState::Closed)
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, ConvState::Idle)
    }

    /// Short name for logs and state-change notifications
    pub fn name(&self) -> &'static str {
        match self {
            ConvState::Idle => "idle",
            ConvState::Responding { .. } => "responding",
            ConvState::Closed => "closed",
        }
    }
}

/// Static inputs to the transition function
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: ConversationId,
    pub classifier: Classifier,
    pub reply_delay: Duration,
}

impl ConvContext {
    pub fn new(conversation_id: ConversationId) -> Self {
        Self {
            conversation_id,
            classifier: Classifier::default(),
            reply_delay: DEFAULT_REPLY_DELAY,
        }
    }

    pub fn with_classifier(mut self, classifier: Classifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_reply_delay(mut self, delay: Duration) -> Self {
        self.reply_delay = delay;
        self
    }
}
