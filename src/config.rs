//! Configuration module for the registry client
//!
//! Settings come from environment variables, optionally overridden by command-line
//! flags, and are then passed explicitly into the client, uploader and poller.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Fixed chunk size shared with the registry's reassembly logic (100 MiB)
pub const CHUNK_SIZE: u64 = 100 * 1024 * 1024;

pub const DEFAULT_API_HOST: &str = "https://api.cloudsmith.io";

pub const ENV_API_KEY: &str = "PKGPUSH_API_KEY";
pub const ENV_API_HOST: &str = "PKGPUSH_API_HOST";
pub const ENV_WAIT_INTERVAL: &str = "PKGPUSH_WAIT_INTERVAL";
pub const ENV_WAIT_ATTEMPTS: &str = "PKGPUSH_WAIT_ATTEMPTS";
pub const ENV_TIMEOUT: &str = "PKGPUSH_TIMEOUT";
pub const ENV_VERBOSE: &str = "PKGPUSH_VERBOSE";

/// Bounded polling settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds to wait between status queries
    pub interval_secs: u64,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            max_attempts: 10,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_host: String,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Request timeout in seconds
    pub timeout: u64,
    pub chunk_size: u64,
    pub poll: PollConfig,
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            api_key: None,
            timeout: 3600,
            chunk_size: CHUNK_SIZE,
            poll: PollConfig::default(),
            verbose: false,
        }
    }
}

impl ClientConfig {
    pub fn new(api_host: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_host: api_host.into(),
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    pub fn with_timeout(mut self, timeout: u64) -> Self {
        self.timeout = timeout;
        self
    }

    /// Create config from environment variables and defaults
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::from_env`] with an explicit variable source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(val) = lookup(ENV_API_HOST).filter(|v| !v.is_empty()) {
            config.api_host = val;
        }
        config.api_key = lookup(ENV_API_KEY).filter(|v| !v.is_empty());
        if let Some(interval) = lookup(ENV_WAIT_INTERVAL).and_then(|v| v.parse().ok()) {
            config.poll.interval_secs = interval;
        }
        if let Some(attempts) = lookup(ENV_WAIT_ATTEMPTS).and_then(|v| v.parse().ok()) {
            config.poll.max_attempts = attempts;
        }
        if let Some(timeout) = lookup(ENV_TIMEOUT).and_then(|v| v.parse().ok()) {
            config.timeout = timeout;
        }
        if let Some(val) = lookup(ENV_VERBOSE) {
            config.verbose = val.to_lowercase() == "true" || val == "1";
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_host.is_empty() {
            return Err(RegistryError::Config("API host cannot be empty".to_string()));
        }

        if !self.api_host.starts_with("http://") && !self.api_host.starts_with("https://") {
            return Err(RegistryError::Config(format!(
                "Invalid API host: {}. Must start with http:// or https://",
                self.api_host
            )));
        }

        if self.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(RegistryError::Config(format!(
                "No API key configured. Set {} or pass --api-key",
                ENV_API_KEY
            )));
        }

        if self.timeout == 0 {
            return Err(RegistryError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }
        if self.chunk_size == 0 {
            return Err(RegistryError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.poll.max_attempts == 0 {
            return Err(RegistryError::Config(
                "wait attempts must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
