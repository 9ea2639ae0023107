//! Server connection settings.
//!
//! Settings come from a JSON file, from `ASSETDB_*` environment variables, or
//! from code via struct update syntax:
//!
//! ```
//! use assetdb_client::ServerConfig;
//!
//! let config = ServerConfig {
//!     server_url: "https://assets.studio.local".to_string(),
//!     ..Default::default()
//! };
//! assert_eq!(config.page_size, 300);
//! ```

use crate::error::{ClientError, ClientResult};
use assetdb_graphql::DEFAULT_PAGE_SIZE;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

pub const ENV_SERVER_URL: &str = "ASSETDB_SERVER_URL";
pub const ENV_API_KEY: &str = "ASSETDB_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "ASSETDB_TIMEOUT_SECS";
pub const ENV_PAGE_SIZE: &str = "ASSETDB_PAGE_SIZE";

/// Connection settings for an asset database server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL of the server, without the `/graphql` suffix.
    pub server_url: String,
    /// Bearer token. Anonymous access when unset.
    pub api_key: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Records requested per page by paginated queries.
    pub page_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            api_key: None,
            timeout_secs: 60,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    pub fn from_env() -> ClientResult<Self> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Reads overrides through `lookup`, starting from the defaults.
    pub fn from_env_with<F>(lookup: F) -> ClientResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.apply_env(lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads settings from a JSON file. Missing keys keep their defaults.
    pub fn from_file(path: &Path) -> ClientResult<Self> {
        let mut config = Self::default();
        config.apply_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlays environment overrides onto these settings.
    ///
    /// Only malformed numbers fail here; call [`ServerConfig::validate`] once
    /// every layer has been applied.
    pub fn apply_env<F>(&mut self, lookup: F) -> ClientResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_SERVER_URL).filter(|url| !url.trim().is_empty()) {
            self.server_url = url.trim().to_string();
        }
        if let Some(key) = lookup(ENV_API_KEY).filter(|key| !key.is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = parse_number(ENV_TIMEOUT_SECS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = parse_number(ENV_PAGE_SIZE, &raw)?;
        }
        Ok(())
    }

    /// Overlays the keys present in a JSON settings file. Not validated.
    pub fn apply_file(&mut self, path: &Path) -> ClientResult<()> {
        let raw = std::fs::read_to_string(path)?;
        let overrides: Map<String, Value> = serde_json::from_str(&raw)?;
        let mut merged = serde_json::to_value(&*self)?;
        if let Value::Object(settings) = &mut merged {
            settings.extend(overrides);
        }
        *self = serde_json::from_value(merged)?;
        Ok(())
    }

    /// Checks that the settings can be used to open a connection.
    pub fn validate(&self) -> ClientResult<()> {
        let url = self.base_url();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::Config(format!(
                "server url must start with http:// or https://, got '{}'",
                self.server_url
            )));
        }
        if self.page_size == 0 {
            return Err(ClientError::Config("page size must be positive".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ClientError::Config("timeout must be positive".to_string()));
        }
        Ok(())
    }

    /// Server URL without trailing slashes.
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> ClientResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ClientError::Config(format!("{key} must be a number, got '{raw}'")))
}
