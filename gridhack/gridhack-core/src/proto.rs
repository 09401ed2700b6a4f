//! Wire types shared by the client and server. Every mutating operation
//! answers with a tagged [`Outcome`]; callers treat transport failure the
//! same as an explicit error outcome.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Success,
    Error,
}

/// The `{status, message}` envelope every command and bookkeeping request
/// comes back in. The message is display text, shown to the player
/// unmodified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub status: Status,
    pub message: String,
}

impl Outcome {
    pub fn success(message: impl Into<String>) -> Self {
        Outcome {
            status: Status::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Outcome {
            status: Status::Error,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

/// Identity payload for the bookkeeping endpoints (availability check,
/// register, reconnect, disconnect, kicked poll).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsernameRequest {
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub is_available: bool,
}

/// Push of a full account record to the server's cloud saves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub username: String,
    pub data: Account,
}

/// A command forwarded verbatim for authoritative dispatch: name plus
/// argument list plus the caller's identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub username: String,
    pub command: String,
    pub args: Vec<String>,
}

/// Watermark query for incremental chat polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSinceQuery {
    pub after: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KickedResponse {
    pub kicked: bool,
}

/// One row of the advertised command table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInfo {
    pub name: String,
    pub description: String,
}
