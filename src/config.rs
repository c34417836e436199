use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::{camera::FacingMode, error::Result};

/// Default configuration file, looked up in the working directory.
pub const CONFIG_FILE: &str = "Voting.toml";

/// Prefix for configuration overrides from the environment, e.g. `VOTING_API_BASE_URL`.
pub const ENV_PREFIX: &str = "VOTING_";

/// Client configuration, derived from defaults, `Voting.toml` and `VOTING_*`
/// environment variables, in increasing order of precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    api_base_url: String,
    session_dir: PathBuf,
    jpeg_quality: u8,
    video_width: u32,
    video_height: u32,
    facing_mode: FacingMode,
    logout_delay_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000".to_string(),
            session_dir: std::env::temp_dir().join("voting-client"),
            jpeg_quality: 85,
            video_width: 1280,
            video_height: 720,
            facing_mode: FacingMode::User,
            logout_delay_ms: 3000,
        }
    }
}

impl Config {
    /// Load the configuration from the default file and the environment.
    pub fn load() -> Result<Self> {
        Self::figment(CONFIG_FILE).extract().map_err(Into::into)
    }

    /// Load the configuration from a specific file and the environment.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        Self::figment(path).extract().map_err(Into::into)
    }

    fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Base URL of the voting backend, without a trailing slash.
    pub fn api_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }

    /// Where the CLI keeps the session credential between invocations.
    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    /// JPEG quality for captured photos, out of 100.
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }

    /// Ideal capture resolution requested from the camera.
    pub fn video_size(&self) -> (u32, u32) {
        (self.video_width, self.video_height)
    }

    /// Requested camera orientation.
    pub fn facing_mode(&self) -> FacingMode {
        self.facing_mode
    }

    /// How long the session survives after a successful vote.
    pub fn logout_delay(&self) -> Duration {
        Duration::from_millis(self.logout_delay_ms)
    }

    /// Override the backend URL, e.g. to point at a test server.
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the post-vote logout delay.
    pub fn with_logout_delay(mut self, delay: Duration) -> Self {
        self.logout_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }
}
