//! Configuration types.

use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Default per-request timeout for backend calls.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Backend client configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the royalty platform API, without a trailing slash.
    pub base_url: String,
    /// Bearer token for the artist session, if any.
    pub api_token: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(SecretString::from(token.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build config from environment variables.
    ///
    /// - `ROYALTY_API_BASE_URL` (required)
    /// - `ROYALTY_API_TOKEN`
    /// - `ROYALTY_API_TIMEOUT_SECS` (default 30)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = lookup("ROYALTY_API_BASE_URL")
            .filter(|s| !s.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("ROYALTY_API_BASE_URL".to_string()))?;

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "ROYALTY_API_BASE_URL".to_string(),
                message: format!("expected an http(s) URL, got {base_url}"),
            });
        }

        let timeout_secs = match lookup("ROYALTY_API_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| ConfigError::InvalidValue {
                key: "ROYALTY_API_TIMEOUT_SECS".to_string(),
                message: e.to_string(),
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        let mut config = Self::new(base_url).with_timeout(Duration::from_secs(timeout_secs));
        if let Some(token) = lookup("ROYALTY_API_TOKEN").filter(|t| !t.is_empty()) {
            config = config.with_token(token);
        }
        Ok(config)
    }
}
