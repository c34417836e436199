//! Voter sign-in and the persisted session credential.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use log::{info, warn};

use crate::{
    api::ApiClient,
    error::Result,
    model::{Credentials, LoginResponse, SessionToken},
};

/// The key the session credential is stored under.
pub const SESSION_KEY: &str = "voting_session";

/// A scoped key-value store that outlives individual workflow steps but not
/// the voter's session.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Remove a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// A store that lives exactly as long as the process.
#[derive(Debug, Default)]
pub struct MemoryStore(Mutex<HashMap<String, String>>);

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut map = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

/// A store backed by one file per key in a directory, so that separate CLI
/// invocations share a session.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Signs voters in and out, keeping the session credential both in memory
/// and in the shared store.
pub struct AuthManager {
    api: ApiClient,
    store: Arc<dyn SessionStore>,
    token: Option<SessionToken>,
}

impl AuthManager {
    pub fn new(api: ApiClient, store: Arc<dyn SessionStore>) -> Self {
        Self {
            api,
            store,
            token: None,
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// The store the credential is persisted in.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        Arc::clone(&self.store)
    }

    /// Authenticate with the backend. On success the new credential replaces
    /// any previous one; on failure nothing is stored or cleared.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<LoginResponse> {
        let login = match self.api.login(credentials).await {
            Ok(login) => login,
            Err(e) => {
                warn!("Login failed for voter {}: {e}", credentials.voter_id);
                return Err(e);
            }
        };

        self.store.set(SESSION_KEY, login.session_token.as_str())?;
        self.token = Some(login.session_token.clone());
        info!("Voter {} logged in", credentials.voter_id);

        Ok(login)
    }

    /// The current credential: the one from this session's login if there was
    /// one, otherwise whatever the store holds.
    pub fn session_token(&self) -> Option<SessionToken> {
        if let Some(token) = &self.token {
            return Some(token.clone());
        }
        match self.store.get(SESSION_KEY) {
            Ok(stored) => stored.map(SessionToken::new).filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Could not read stored session: {e}");
                None
            }
        }
    }

    /// Forget the credential everywhere. Safe to call repeatedly.
    pub fn logout(&mut self) -> Result<()> {
        self.token = None;
        self.store.remove(SESSION_KEY)?;
        info!("Logged out");
        Ok(())
    }
}
