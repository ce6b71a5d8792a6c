//! Runtime configuration.
//!
//! Values come from three layers, later ones winning: built-in defaults,
//! an optional JSON file, and `GNOLINK_*` environment variables.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::gateway::{DEFAULT_DROPPED_AFTER, DEFAULT_MAX_POLL_ERRORS, DEFAULT_POLL_INTERVAL_MS};
use crate::network::GNOSIS_CHAIN_ID;

/// Environment variable holding the JSON-RPC endpoint.
pub const ENV_RPC_URL: &str = "GNOLINK_RPC_URL";
/// Environment variable holding the required chain id.
pub const ENV_REQUIRED_CHAIN_ID: &str = "GNOLINK_REQUIRED_CHAIN_ID";
/// Environment variable holding the receipt poll interval in milliseconds.
pub const ENV_POLL_INTERVAL_MS: &str = "GNOLINK_POLL_INTERVAL_MS";
/// Environment variable holding the dropped-transaction poll threshold.
pub const ENV_DROPPED_AFTER: &str = "GNOLINK_DROPPED_AFTER";
/// Environment variable holding the tolerated run of failed receipt polls.
pub const ENV_MAX_POLL_ERRORS: &str = "GNOLINK_MAX_POLL_ERRORS";

/// Configuration for the transfer core and its RPC adapters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GnolinkConfig {
    /// JSON-RPC endpoint.
    pub rpc_url: Option<String>,
    /// Chain a signer must be on before a transfer is accepted.
    pub required_chain_id: u64,
    /// Delay between receipt polls in milliseconds.
    pub poll_interval_ms: u64,
    /// Consecutive polls a transaction may be unknown before it counts as dropped.
    pub dropped_after: u32,
    /// Consecutive failed polls tolerated before confirmation is given up.
    pub max_poll_errors: u32,
}

impl Default for GnolinkConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            required_chain_id: GNOSIS_CHAIN_ID,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            dropped_after: DEFAULT_DROPPED_AFTER,
            max_poll_errors: DEFAULT_MAX_POLL_ERRORS,
        }
    }
}

impl GnolinkConfig {
    /// Load a JSON config file. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `GNOLINK_*` overrides read through `lookup`.
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_RPC_URL) {
            self.rpc_url = Some(url);
        }
        if let Some(raw) = lookup(ENV_REQUIRED_CHAIN_ID) {
            self.required_chain_id = parse_var(ENV_REQUIRED_CHAIN_ID, &raw)?;
        }
        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_var(ENV_POLL_INTERVAL_MS, &raw)?;
        }
        if let Some(raw) = lookup(ENV_DROPPED_AFTER) {
            self.dropped_after = parse_var(ENV_DROPPED_AFTER, &raw)?;
        }
        if let Some(raw) = lookup(ENV_MAX_POLL_ERRORS) {
            self.max_poll_errors = parse_var(ENV_MAX_POLL_ERRORS, &raw)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Set the JSON-RPC endpoint.
    #[must_use]
    pub fn rpc_url(mut self, url: impl Into<String>) -> Self {
        self.rpc_url = Some(url.into());
        self
    }

    /// Set the chain transfers require.
    #[must_use]
    pub const fn required_chain_id(mut self, chain_id: u64) -> Self {
        self.required_chain_id = chain_id;
        self
    }

    /// Set the receipt poll interval.
    #[must_use]
    pub const fn poll_interval_ms(mut self, millis: u64) -> Self {
        self.poll_interval_ms = millis;
        self
    }

    /// Set the dropped-transaction threshold.
    #[must_use]
    pub const fn dropped_after(mut self, polls: u32) -> Self {
        self.dropped_after = polls;
        self
    }

    /// Set the tolerated run of failed receipt polls.
    #[must_use]
    pub const fn max_poll_errors(mut self, polls: u32) -> Self {
        self.max_poll_errors = polls;
        self
    }

    /// The receipt poll interval as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The RPC endpoint, or an error if none is configured.
    pub fn require_rpc_url(&self) -> Result<&str, ConfigError> {
        self.rpc_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing(ENV_RPC_URL))
    }

    /// Check values that would make the adapters misbehave.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("poll_interval_ms must be positive"));
        }
        if self.dropped_after == 0 {
            return Err(ConfigError::invalid("dropped_after must be positive"));
        }
        if self.max_poll_errors == 0 {
            return Err(ConfigError::invalid("max_poll_errors must be positive"));
        }
        if self
            .rpc_url
            .as_deref()
            .is_some_and(|url| url.trim().is_empty())
        {
            return Err(ConfigError::invalid("rpc_url must not be empty"));
        }
        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::invalid(format!("{key}={raw:?} is not a valid number")))
}
