use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The three facts a voter signs in with. No client-side validation is done;
/// the backend is the sole judge.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub voter_id: String,
    pub dob: String,
    pub email: String,
}

impl Credentials {
    pub fn new(
        voter_id: impl Into<String>,
        dob: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            voter_id: voter_id.into(),
            dob: dob.into(),
            email: email.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("voter_id", &self.voter_id)
            .finish_non_exhaustive()
    }
}

/// An opaque bearer token identifying an authenticated voter.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// Keep tokens out of logs.
impl Debug for SessionToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Whatever the backend chooses to tell us about the voter.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterInfo(Map<String, Value>);

impl VoterInfo {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// The voter's display name, if the backend supplied one.
    pub fn name(&self) -> Option<&str> {
        self.get("name").and_then(Value::as_str)
    }
}

/// Successful response from `POST /api/auth/login`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginResponse {
    pub session_token: SessionToken,
    #[serde(default)]
    pub voter_info: VoterInfo,
}
