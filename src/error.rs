//! Crate-level error type

use crate::catalogue::CatalogueError;
use crate::conversation::ConversationId;
use crate::runtime::{SessionError, StoreError};
use crate::state_machine::TransitionError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("No valid session, sign in first")]
    Unauthenticated,
    #[error("Conversation not found: {0}")]
    ConversationNotFound(ConversationId),
    #[error("Conversation runtime has stopped: {0}")]
    RuntimeStopped(ConversationId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Catalogue(#[from] CatalogueError),
}

pub type EngineResult<T> = Result<T, EngineError>;
