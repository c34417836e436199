use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /api/vote/submit`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRequest {
    pub vote_choice: String,
    pub kyc_image_hash: String,
    pub timestamp: String,
}

/// Response to a vote submission. Only an explicit `success: true` counts.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct VoteResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub receipt: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

impl VoteResponse {
    pub fn is_success(&self) -> bool {
        self.success == Some(true)
    }
}

/// Proof that the backend recorded the vote.
#[derive(Debug, Clone, PartialEq)]
pub struct VoteReceipt {
    pub vote_choice: String,
    /// Backend-specific receipt data, if any was returned.
    pub receipt: Option<Value>,
}
