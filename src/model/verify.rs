use serde::{Deserialize, Serialize};

/// Where a voter's vote sits in the backend's tamper-evident log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteProof {
    pub block_index: u64,
    pub block_hash: String,
    pub timestamp: String,
    pub vote_hash: String,
}

/// Body of `GET /api/verify/<voter_id_hash>`.
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyResponse {
    pub verified: bool,
    #[serde(default)]
    pub proof: Option<VoteProof>,
}

/// Integrity report for the backend's vote log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    pub valid: bool,
    pub total_blocks: u64,
    /// First block that failed verification.
    #[serde(default)]
    pub error_at_block: Option<u64>,
}
