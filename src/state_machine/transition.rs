//! Pure state transition function

use super::state::{PendingTurn, TurnPhase};
use super::{ConvContext, ConvState, Effect, Event};
use crate::conversation::{Message, MessageId};
use thiserror::Error;

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConvState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConvState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    pub fn with_effects(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

/// Errors that can occur during transition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Conversation is closed, cannot accept message")]
    ConversationClosed,
}

/// Pure transition function
///
/// Given the same inputs it always produces the same outputs, with no I/O.
/// Events that refer to turns the state no longer tracks are stale and
/// leave the state untouched.
pub fn transition(
    state: &ConvState,
    context: &ConvContext,
    event: Event,
) -> Result<TransitionResult, TransitionError> {
    match (state, event) {
        // ============================================================
        // Teardown
        // ============================================================
        (ConvState::Closed, Event::UserMessage { .. }) => Err(TransitionError::ConversationClosed),

        // Deliveries after teardown are dropped silently
        (ConvState::Closed, _) => Ok(TransitionResult::new(ConvState::Closed)),

        (_, Event::Teardown) => {
            Ok(TransitionResult::new(ConvState::Closed).with_effect(Effect::CancelDeliveries))
        }

        // ============================================================
        // User messages
        // ============================================================

        // Blank input never starts a turn
        (_, Event::UserMessage { text, .. }) if text.trim().is_empty() => {
            Ok(TransitionResult::new(state.clone()))
        }

        (
            ConvState::Idle | ConvState::Responding { .. },
            Event::UserMessage { text, message_id },
        ) => {
            let category = context.classifier.classify(&text);
            let mut turns = state.pending_turns().to_vec();
            turns.push(PendingTurn::generating(message_id, category));

            Ok(TransitionResult::new(ConvState::Responding { turns })
                .with_effect(Effect::append(Message::user(message_id, text)))
                .with_effect(Effect::notify_phase(message_id, TurnPhase::Classifying))
                .with_effect(Effect::notify_phase(message_id, TurnPhase::Generating))
                .with_effect(Effect::GenerateReply {
                    turn_id: message_id,
                    category,
                }))
        }

        // ============================================================
        // Reply generation and delivery
        // ============================================================
        (ConvState::Responding { turns }, Event::ReplyReady { turn_id, reply }) => {
            let Some(index) = find_turn(turns, turn_id, TurnPhase::Generating) else {
                return Ok(TransitionResult::new(state.clone()));
            };

            let mut turns = turns.clone();
            turns[index].reply = Some(reply);
            turns[index].phase = TurnPhase::Scheduled;

            Ok(TransitionResult::new(ConvState::Responding { turns })
                .with_effect(Effect::notify_phase(turn_id, TurnPhase::Scheduled))
                .with_effect(Effect::ScheduleDelivery {
                    turn_id,
                    delay: context.reply_delay,
                }))
        }

        (ConvState::Responding { turns }, Event::DeliveryDue { turn_id }) => {
            let Some(index) = find_turn(turns, turn_id, TurnPhase::Scheduled) else {
                return Ok(TransitionResult::new(state.clone()));
            };
            if turns[index].due {
                return Ok(TransitionResult::new(state.clone()));
            }

            let mut turns = turns.clone();
            turns[index].due = true;

            // Replies land in submission order: only the leading run of due
            // turns is delivered, later ones wait for the earlier timers.
            let ready = turns.iter().take_while(|t| t.is_deliverable()).count();
            let effects = turns
                .drain(..ready)
                .filter_map(|turn| {
                    turn.reply.map(|reply| {
                        [
                            Effect::append(reply),
                            Effect::notify_phase(turn.turn_id, TurnPhase::Delivered),
                        ]
                    })
                })
                .flatten()
                .collect::<Vec<_>>();

            let new_state = if turns.is_empty() {
                ConvState::Idle
            } else {
                ConvState::Responding { turns }
            };
            Ok(TransitionResult::new(new_state).with_effects(effects))
        }

        // Reply or delivery for a turn nobody is waiting on
        (ConvState::Idle, Event::ReplyReady { .. } | Event::DeliveryDue { .. }) => {
            Ok(TransitionResult::new(ConvState::Idle))
        }
    }
}

fn find_turn(turns: &[PendingTurn], turn_id: MessageId, phase: TurnPhase) -> Option<usize> {
    turns
        .iter()
        .position(|t| t.turn_id == turn_id && t.phase == phase)
}
