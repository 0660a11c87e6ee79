//! Events that can occur in a conversation

use crate::conversation::{Message, MessageId};

/// Events that trigger state transitions
#[derive(Debug, Clone)]
pub enum Event {
    // User events
    UserMessage {
        text: String,
        /// Id of the user message; also identifies the turn
        message_id: MessageId,
    },

    // Dispatcher events
    ReplyReady {
        turn_id: MessageId,
        reply: Message,
    },
    DeliveryDue {
        turn_id: MessageId,
    },

    /// The owning view went away; pending deliveries must not land
    Teardown,
}
