use reqwest::Method;

use super::{ApiClient, VOTE_PATH};
use crate::{
    error::{Error, Result},
    model::{vote::VoteResponse, SessionToken, VoteReceipt, VoteRequest},
};

const VOTE_FAILED: &str = "Unknown error";

impl ApiClient {
    /// Submit a vote. Anything short of a 2xx status with `success: true` is a rejection.
    pub async fn submit_vote(
        &self,
        token: &SessionToken,
        vote: &VoteRequest,
    ) -> Result<VoteReceipt> {
        let response = self
            .send(Method::POST, VOTE_PATH, |req| {
                req.bearer_auth(token.as_str()).json(vote)
            })
            .await?;

        let body = response.json::<VoteResponse>().unwrap_or_default();
        if !response.is_success() || !body.is_success() {
            let message = body
                .error
                .filter(|msg| !msg.is_empty())
                .unwrap_or_else(|| VOTE_FAILED.to_string());
            return Err(Error::VoteSubmission(message));
        }

        Ok(VoteReceipt {
            vote_choice: vote.vote_choice.clone(),
            receipt: body.receipt,
        })
    }
}
