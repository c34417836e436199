use reqwest::Method;

use super::{ApiClient, LOGIN_PATH};
use crate::{
    error::{Error, Result},
    model::{Credentials, LoginResponse},
};

const AUTH_FAILED: &str = "Authentication failed";

impl ApiClient {
    /// Exchange voter credentials for a session token.
    pub async fn login(&self, credentials: &Credentials) -> Result<LoginResponse> {
        let response = self
            .send(Method::POST, LOGIN_PATH, |req| req.json(credentials))
            .await?;

        if !response.is_success() {
            return Err(Error::Authentication(response.error_message(AUTH_FAILED)));
        }

        response
            .json::<LoginResponse>()
            .filter(|login| !login.session_token.is_empty())
            .ok_or_else(|| Error::Authentication(AUTH_FAILED.to_string()))
    }
}
