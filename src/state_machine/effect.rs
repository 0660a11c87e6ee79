//! Effects produced by state transitions

use super::state::TurnPhase;
use crate::classifier::Category;
use crate::conversation::{Message, MessageId};
use std::time::Duration;

/// Effects to be executed after state transition
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Append a message to the conversation store
    AppendMessage { message: Message },

    /// Build the assistant reply for a classified turn
    GenerateReply { turn_id: MessageId, category: Category },

    /// Deliver the turn's reply after `delay` (cancelable)
    ScheduleDelivery { turn_id: MessageId, delay: Duration },

    /// Cancel every scheduled delivery of this conversation
    CancelDeliveries,

    /// Notify subscribers that a turn moved to a new phase
    NotifyPhase { turn_id: MessageId, phase: TurnPhase },
}

impl Effect {
    pub fn append(message: Message) -> Self {
        Effect::AppendMessage { message }
    }

    pub fn notify_phase(turn_id: MessageId, phase: TurnPhase) -> Self {
        Effect::NotifyPhase { turn_id, phase }
    }
}
