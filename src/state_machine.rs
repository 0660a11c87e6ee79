//! Response dispatch state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime executes the effects each transition returns.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{ConvContext, ConvState, PendingTurn, TurnPhase};
pub use transition::{transition, TransitionError, TransitionResult};
