//! Trade Assistant - simulated AI trading assistant engine
//!
//! A conversation engine that answers user messages with canned replies,
//! attaching a synthetic price chart or a news bundle depending on what
//! the message asks for. Replies are delivered after a fixed, cancelable
//! delay to mimic inference latency.

pub mod catalogue;
pub mod classifier;
pub mod config;
pub mod conversation;
pub mod error;
pub mod input;
pub mod logging;
pub mod market;
pub mod reply;
pub mod runtime;
pub mod state_machine;

pub use catalogue::Catalogue;
pub use classifier::{Category, Classifier, Rule};
pub use config::EngineConfig;
pub use conversation::{Conversation, ConversationId, Message, MessageId, Role};
pub use error::EngineError;
pub use market::{ChartSeries, Impact, NewsBundle, NewsItem, PricePoint, Sentiment};
pub use runtime::{
    AnonymousSession, ChatSummary, ConversationUpdate, InMemoryStore,
    MessageStore, RuntimeManager, SessionProvider,
};
