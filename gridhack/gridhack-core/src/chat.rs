//! The shared chat log and the moderation sets that gate it.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only, server-owned message log. Clients poll it incrementally
/// with a watermark: the timestamp of the last message they have already
/// displayed.
#[derive(Debug, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessage>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message, stamped with the current wall clock. Moderation
    /// checks happen before this is called.
    pub fn append(&mut self, sender: &str, message: &str) {
        self.messages.push(ChatMessage {
            sender: sender.to_string(),
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn history(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Messages strictly after the watermark. A client that advances its
    /// watermark to the last returned timestamp never sees a message
    /// twice.
    pub fn since(&self, watermark: DateTime<Utc>) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| m.timestamp > watermark)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("You are muted and cannot chat.")]
    Muted,
    #[error("You are banned from chat.")]
    Banned,
}

/// Username-keyed moderation state, mutated from the operator console and
/// consulted on every chat append. Kick flags are one-shot: reporting one
/// to the client consumes it, since a kick ends a session rather than
/// standing as a ban.
#[derive(Debug, Default)]
pub struct Moderation {
    muted: HashSet<String>,
    banned: HashSet<String>,
    kicked: HashSet<String>,
}

impl Moderation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checked before a message is recorded. Bans outrank mutes.
    pub fn check(&self, username: &str) -> Result<(), ChatError> {
        if self.banned.contains(username) {
            return Err(ChatError::Banned);
        }
        if self.muted.contains(username) {
            return Err(ChatError::Muted);
        }
        Ok(())
    }

    pub fn mute(&mut self, username: &str) -> bool {
        self.muted.insert(username.to_string())
    }

    pub fn unmute(&mut self, username: &str) -> bool {
        self.muted.remove(username)
    }

    pub fn ban(&mut self, username: &str) -> bool {
        self.banned.insert(username.to_string())
    }

    pub fn unban(&mut self, username: &str) -> bool {
        self.banned.remove(username)
    }

    pub fn kick(&mut self, username: &str) {
        self.kicked.insert(username.to_string());
    }

    /// Consume a pending kick for this user, reporting whether one was
    /// set.
    pub fn take_kick(&mut self, username: &str) -> bool {
        self.kicked.remove(username)
    }

    pub fn muted_users(&self) -> Vec<String> {
        let mut users: Vec<_> = self.muted.iter().cloned().collect();
        users.sort();
        users
    }

    pub fn banned_users(&self) -> Vec<String> {
        let mut users: Vec<_> = self.banned.iter().cloned().collect();
        users.sort();
        users
    }
}
