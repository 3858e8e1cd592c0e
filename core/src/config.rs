//! Client configuration.
//!
//! Defaults match a local GraphQL server on port 4000 with a 10 ms batching
//! window. `from_env` overrides individual fields from `TODO_*` variables.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_URI: &str = "http://localhost:4000/graphql";

/// Settings for the transport link chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// GraphQL endpoint every batch is POSTed to.
    pub uri: String,
    /// How long the batching link waits after the first queued operation.
    pub batch_interval: Duration,
    /// Maximum operations per HTTP request.
    pub batch_max: usize,
    pub timeout: Duration,
    /// Static headers attached by the request link.
    pub headers: Vec<(String, String)>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            batch_interval: Duration::from_millis(10),
            batch_max: 10,
            timeout: Duration::from_secs(30),
            headers: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            ..Self::default()
        }
    }

    /// Read overrides from `TODO_GRAPHQL_URI`, `TODO_BATCH_INTERVAL_MS`,
    /// `TODO_BATCH_MAX` and `TODO_TIMEOUT_SECS`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(uri) = lookup("TODO_GRAPHQL_URI") {
            config.uri = uri;
        }
        if let Some(ms) = number(&lookup, "TODO_BATCH_INTERVAL_MS")? {
            config.batch_interval = Duration::from_millis(ms);
        }
        if let Some(max) = number(&lookup, "TODO_BATCH_MAX")? {
            if max == 0 {
                return Err(ConfigError::Zero {
                    key: "TODO_BATCH_MAX",
                });
            }
            config.batch_max = max as usize;
        }
        if let Some(secs) = number(&lookup, "TODO_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }
}

fn number<F>(lookup: &F, key: &'static str) -> Result<Option<u64>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidNumber { key, value }),
    }
}
