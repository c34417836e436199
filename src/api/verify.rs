use data_encoding::HEXLOWER;
use reqwest::{Method, StatusCode};
use sha2::{Digest, Sha256};

use super::{ApiClient, CHAIN_PATH, VERIFY_PATH};
use crate::{
    error::{Error, Result},
    model::{verify::VerifyResponse, ChainStatus, VoteProof},
};

/// The backend indexes votes by the SHA-256 of the voter ID, hex-encoded.
pub fn voter_id_hash(voter_id: &str) -> String {
    HEXLOWER.encode(&Sha256::digest(voter_id.as_bytes()))
}

impl ApiClient {
    /// Look up the proof that `voter_id`'s vote was recorded.
    /// Returns `None` if the backend has no vote for that voter.
    pub async fn vote_proof(&self, voter_id: &str) -> Result<Option<VoteProof>> {
        let path = format!("{VERIFY_PATH}/{}", voter_id_hash(voter_id));
        let response = self.send(Method::GET, &path, |req| req).await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(Error::Verification(
                response.error_message("Vote verification failed"),
            ));
        }

        Ok(response
            .json::<VerifyResponse>()
            .filter(|verify| verify.verified)
            .and_then(|verify| verify.proof))
    }

    /// Ask the backend to check the integrity of its vote log.
    pub async fn chain_status(&self) -> Result<ChainStatus> {
        let response = self.send(Method::GET, CHAIN_PATH, |req| req).await?;

        if !response.is_success() {
            return Err(Error::Verification(
                response.error_message("Chain verification failed"),
            ));
        }

        response
            .json::<ChainStatus>()
            .ok_or_else(|| Error::Verification("Malformed chain status".to_string()))
    }
}
