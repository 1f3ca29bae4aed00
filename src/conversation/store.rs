//! Bounded per-user conversation history store.

use crate::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Speaker role of a conversation entry, in chat-completions wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub role: Role,
    pub content: String,
}

impl ConversationEntry {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// In-memory map from user identity to a bounded, ordered message log.
///
/// Histories are created lazily on first use, cleared (not removed) on reset,
/// and live for the lifetime of the process. Each operation holds the lock
/// for its own duration only; there is no cross-request transaction for a
/// user, so two in-flight requests for the same user may interleave their
/// appends.
#[derive(Debug)]
pub struct ConversationStore {
    histories: RwLock<HashMap<UserId, Vec<ConversationEntry>>>,
    max_entries: usize,
}

impl ConversationStore {
    /// Create an empty store retaining at most `max_entries` per user.
    pub fn new(max_entries: usize) -> Self {
        Self {
            histories: RwLock::new(HashMap::new()),
            max_entries,
        }
    }

    /// Current history for a user, oldest first. Registers an empty history
    /// for users not seen before. Never fails.
    pub async fn history(&self, user_id: UserId) -> Vec<ConversationEntry> {
        let mut histories = self.histories.write().await;
        histories.entry(user_id).or_default().clone()
    }

    /// Append one entry to the end of a user's history, evicting from the
    /// front once the bound is exceeded. The most recent `max_entries`
    /// entries are retained in their original relative order.
    pub async fn append(&self, user_id: UserId, entry: ConversationEntry) {
        let mut histories = self.histories.write().await;
        let history = histories.entry(user_id).or_default();
        history.push(entry);
        if history.len() > self.max_entries {
            let excess = history.len() - self.max_entries;
            history.drain(..excess);
        }
    }

    /// Reset a user's history to empty. Works for unknown users too, leaving
    /// an empty history registered under their id.
    pub async fn clear(&self, user_id: UserId) {
        let mut histories = self.histories.write().await;
        histories.insert(user_id, Vec::new());
    }
}
