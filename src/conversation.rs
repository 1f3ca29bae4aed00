//! Per-user conversation history.

pub mod store;

pub use store::{ConversationEntry, ConversationStore, Role};
