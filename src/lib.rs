//! Relaybot: a Telegram bot that relays chat messages to a completion API
//! with a bounded per-user conversation history.

pub mod config;
pub mod conversation;
pub mod error;
pub mod llm;
pub mod messaging;
pub mod relay;

pub use error::{Error, Result};

/// Platform-supplied user identifier type.
pub type UserId = u64;
