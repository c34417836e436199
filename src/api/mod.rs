//! HTTP access to the voting backend. One method per endpoint; every failure,
//! structured or transport-level, comes back as an [`Error`].

use log::warn;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::{
    config::Config,
    error::{Error, Result},
    logging::{log_request, log_response, log_transport_failure},
    model::ErrorBody,
};

mod auth;
mod kyc;
mod verify;
mod vote;

pub use verify::voter_id_hash;

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const UPLOAD_PATH: &str = "/api/kyc/upload";
pub const VOTE_PATH: &str = "/api/vote/submit";
pub const VERIFY_PATH: &str = "/api/verify";
pub const CHAIN_PATH: &str = "/api/chain/verify";

/// A handle on the backend. Cheap to clone; clones share a connection pool.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.api_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    /// Send a request, logging both directions, and read the whole body.
    /// Only a missing response is an error here; status handling is left to the caller.
    async fn send(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<ApiResponse> {
        let id = log_request(&method, path);
        let request = build(self.request(method, path));

        let response = match request.send().await {
            Ok(response) => response,
            Err(err) => {
                log_transport_failure(id, path, &err);
                return Err(Error::Network(err));
            }
        };

        let status = response.status();
        log_response(id, status, path);
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse { status, body })
    }
}

/// A fully-read backend response.
#[derive(Debug)]
struct ApiResponse {
    status: StatusCode,
    body: Vec<u8>,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Decode the body, or `None` if it doesn't have the expected shape.
    fn json<T: DeserializeOwned>(&self) -> Option<T> {
        match serde_json::from_slice(&self.body) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!("Unexpected response body from backend: {err}");
                None
            }
        }
    }

    /// The backend's error message, or `fallback` if it gave none.
    fn error_message(&self, fallback: &str) -> String {
        ErrorBody::from_slice(&self.body).message_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use crate::{model::Credentials, test_support::MockBackend};

    use super::*;

    #[test]
    fn base_url_normalised() {
        assert_eq!(
            ApiClient::new("http://localhost:5000/").base_url(),
            "http://localhost:5000"
        );
        assert_eq!(
            ApiClient::from_config(&Config::default()).base_url(),
            "http://localhost:5000"
        );
    }

    #[client_test]
    async fn unreachable_backend(mut backend: MockBackend) {
        let api = backend.api();
        backend.shutdown().await;

        let err = api.login(&Credentials::example()).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
    }
}
