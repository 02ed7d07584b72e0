//! Tracker configuration.

use std::{fmt, time::Duration};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use toolsight_delivery::{ClientConfig, RetryPolicy, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS};

use crate::error::{Result, TrackerError};

const CONFIG_FILE: &str = "toolsight.toml";
const ENV_PREFIX: &str = "TOOLSIGHT_";

/// Production collector endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.toolsight.dev/v1/events";

/// Tracker configuration.
///
/// Every field except `api_key` has a default. Values are resolved once,
/// when the tracker is built, and never re-read.
///
/// Configuration is loaded by [`Config::load`] in priority order:
/// 1. Environment variables prefixed with `TOOLSIGHT_` (highest priority)
/// 2. Configuration file (`toolsight.toml`)
/// 3. Built-in defaults (lowest priority)
///
/// # Example
///
/// ```
/// use toolsight::Config;
///
/// let config = Config::new("tk_live_123").with_retries(1).with_debug(true);
///
/// assert_eq!(config.timeout_ms, 5000);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Project api key sent as `x-api-key`.
    ///
    /// Environment variable: `TOOLSIGHT_API_KEY`
    #[serde(default)]
    pub api_key: String,
    /// Collector URL.
    ///
    /// Environment variable: `TOOLSIGHT_ENDPOINT`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Per-attempt timeout in milliseconds.
    ///
    /// Environment variable: `TOOLSIGHT_TIMEOUT_MS`
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Retries after the first attempt.
    ///
    /// Environment variable: `TOOLSIGHT_RETRIES`
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Log every attempt, retry and failure.
    ///
    /// Environment variable: `TOOLSIGHT_DEBUG`
    #[serde(default)]
    pub debug: bool,
}

impl Config {
    /// Defaults for everything but the api key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Self::default() }
    }

    /// Overrides the collector endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Overrides the per-attempt timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Overrides the retry budget.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Enables or disables diagnostic logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Load configuration from defaults, `toolsight.toml`, and `TOOLSIGHT_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Fails when a source cannot be parsed or the result does not validate.
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Self::default()))
                .merge(Toml::file(CONFIG_FILE))
                .merge(Env::prefixed(ENV_PREFIX)),
        )
    }

    /// Extracts and validates configuration from a caller-assembled figment.
    ///
    /// # Errors
    ///
    /// Fails when extraction fails or the result does not validate.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `TrackerError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TrackerError::invalid_config("api_key is required"));
        }

        if self.timeout_ms == 0 {
            return Err(TrackerError::invalid_config("timeout_ms must be greater than 0"));
        }

        let host = self
            .endpoint
            .strip_prefix("https://")
            .or_else(|| self.endpoint.strip_prefix("http://"));
        if !host.is_some_and(|rest| !rest.is_empty() && !rest.starts_with('/')) {
            return Err(TrackerError::invalid_config(format!(
                "endpoint must be an http(s) URL, got {:?}",
                self.endpoint
            )));
        }

        Ok(())
    }

    /// Api key with everything past the first four characters masked.
    pub fn api_key_masked(&self) -> String {
        let visible: String = self.api_key.chars().take(4).collect();
        format!("{visible}***")
    }

    /// Convert to the transport's configuration.
    pub fn to_client_config(&self) -> ClientConfig {
        let mut client_config = ClientConfig::new(self.endpoint.clone(), self.api_key.clone());
        client_config.timeout = Duration::from_millis(self.timeout_ms);
        client_config.debug = self.debug;
        client_config
    }

    /// Convert to retry policy.
    pub fn to_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::with_max_retries(self.retries)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_endpoint(),
            timeout_ms: default_timeout_ms(),
            retries: default_retries(),
            debug: false,
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &self.api_key_masked())
            .field("endpoint", &self.endpoint)
            .field("timeout_ms", &self.timeout_ms)
            .field("retries", &self.retries)
            .field("debug", &self.debug)
            .finish()
    }
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
