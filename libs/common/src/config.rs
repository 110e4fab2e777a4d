//! Client configuration
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! environment variables prefixed with `CLUBADMIN_`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::ConfigResult;

/// Default backend URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Prefix of the environment variables read by [`ClientConfig::load`]
pub const ENV_PREFIX: &str = "CLUBADMIN";

/// Where the session token lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScope {
    /// Kept in memory for the lifetime of the process
    Session,
    /// Written to `<token_dir>/token`
    #[default]
    Persistent,
}

/// Client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub base_url: String,
    /// Storage area for the session token
    pub token_scope: TokenScope,
    /// Directory holding the persistent token
    pub token_dir: PathBuf,
    /// Per-request timeout; requests wait indefinitely when unset
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ClientConfig {
    /// Load the configuration
    ///
    /// # Environment Variables
    /// - `CLUBADMIN_BASE_URL`: backend URL (default: "http://localhost:3000")
    /// - `CLUBADMIN_TOKEN_SCOPE`: "session" or "persistent" (default: "persistent")
    /// - `CLUBADMIN_TOKEN_DIR`: directory of the persistent token
    /// - `CLUBADMIN_REQUEST_TIMEOUT_SECS`: optional request timeout
    pub fn load(file: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("token_scope", "persistent")?
            .set_default(
                "token_dir",
                default_token_dir().to_string_lossy().into_owned(),
            )?;

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        let mut config: ClientConfig = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()?;

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(config)
    }

    /// The configured timeout, if any
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn default_token_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("clubadmin")
}
