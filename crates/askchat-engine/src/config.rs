//! Configuration for the askchat client.
//!
//! Configuration lives in a JSON file (by default `.askchat/config.json` in
//! the working directory). Every field has a default, so a missing file or a
//! partial file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Directory holding the config file, relative to the working directory.
pub const CONFIG_DIR: &str = ".askchat";

/// Config file name inside [`CONFIG_DIR`].
pub const CONFIG_FILE: &str = "config.json";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "ASKCHAT_ENDPOINT";

/// Main configuration for askchat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL the ask path is resolved against.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Path of the exchange endpoint, relative to `endpoint`.
    #[serde(default = "default_ask_path")]
    pub ask_path: String,

    /// Per-request timeout in seconds (0 waits indefinitely).
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// Remove bracketed product identifiers from assistant replies.
    #[serde(default)]
    pub strip_product_ids: bool,

    /// File receiving log output while the TUI is running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

fn default_endpoint() -> String {
    "http://localhost:8080/".into()
}

fn default_ask_path() -> String {
    "ask".into()
}

fn default_timeout() -> u64 {
    300
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            ask_path: default_ask_path(),
            timeout_seconds: default_timeout(),
            strip_product_ids: false,
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        serde_json::from_str(&content).map_err(ConfigError::Parse)
    }

    /// Load configuration from a file if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Default config path under a directory.
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Apply an endpoint override from the environment, if set.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_env_lookup(|key| std::env::var(key).ok())
    }

    /// Apply environment overrides read through `lookup`.
    #[must_use]
    pub fn with_env_lookup(self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        self.with_endpoint_override(lookup(ENDPOINT_ENV))
    }

    /// Replace the endpoint when an override is present and non-empty.
    #[must_use]
    pub fn with_endpoint_override(mut self, endpoint: Option<String>) -> Self {
        if let Some(endpoint) = endpoint.filter(|e| !e.trim().is_empty()) {
            self.endpoint = endpoint;
        }
        self
    }

    /// Request timeout, or `None` when disabled.
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_seconds > 0).then(|| Duration::from_secs(self.timeout_seconds))
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),
}
