//! Types exchanged with the voting backend.

use chrono::{SecondsFormat, Utc};
use serde::Deserialize;

pub mod auth;
pub mod kyc;
pub mod verify;
pub mod vote;

pub use auth::{Credentials, LoginResponse, SessionToken, VoterInfo};
pub use kyc::{CapturedPhoto, UploadReceipt};
pub use verify::{ChainStatus, VoteProof};
pub use vote::{VoteReceipt, VoteRequest};

/// The current time as an ISO-8601 UTC timestamp with millisecond precision,
/// e.g. `2024-05-01T09:30:00.123Z`.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// The part of a failure body we care about. Every endpoint may attach a
/// human-readable `error` message to a non-success response.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Parse a response body leniently; anything unparseable carries no message.
    pub fn from_slice(body: &[u8]) -> Self {
        serde_json::from_slice(body).unwrap_or_default()
    }

    /// The backend's message, or `fallback` if none was given.
    pub fn message_or(self, fallback: &str) -> String {
        self.error
            .filter(|msg| !msg.is_empty())
            .unwrap_or_else(|| fallback.to_string())
    }
}
