//! Error types for artist onboarding.

use serde::Deserialize;

/// Message shown when a backend failure carries nothing readable.
pub const DEFAULT_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Error envelope the backend returns alongside non-2xx responses.
///
/// `errors` is either a field map (`{ field: "msg" | ["msg", ...] }`) or a bare list.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub errors: Option<serde_json::Value>,
}

impl ErrorEnvelope {
    /// First human-readable entry in `errors`, if any.
    pub fn first_error(&self) -> Option<&str> {
        fn first_str(value: &serde_json::Value) -> Option<&str> {
            match value {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Array(items) => items.iter().find_map(first_str),
                _ => None,
            }
        }

        match self.errors.as_ref()? {
            serde_json::Value::Object(fields) => fields.values().find_map(first_str),
            other => first_str(other),
        }
    }
}

/// Backend call failures.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Request to {endpoint} failed with status {status}")]
    Status {
        endpoint: String,
        status: u16,
        envelope: ErrorEnvelope,
    },

    #[error("{0}")]
    Transport(String),

    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse { endpoint: String, reason: String },

    #[error("Invalid base URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ApiError {
    /// Collapse any backend failure into a plain-language message.
    ///
    /// Preference order: `message`, `detail`, first entry of `errors`, the raw
    /// error text, then [`DEFAULT_ERROR_MESSAGE`].
    pub fn user_message(&self) -> String {
        let picked = match self {
            Self::Status { envelope, .. } => envelope
                .message
                .as_deref()
                .or(envelope.detail.as_deref())
                .or_else(|| envelope.first_error())
                .map(str::to_string),
            Self::Transport(raw) => Some(raw.clone()),
            Self::InvalidResponse { .. } | Self::InvalidBaseUrl { .. } => None,
        };

        picked
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Errors raised by the onboarding context and wizard.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("{}", .0.user_message())]
    Api(#[from] ApiError),

    #[error("The {step} step is required and cannot be skipped")]
    StepRequired { step: String },

    #[error("The {step} step has no skip action")]
    NotSkippable { step: String },

    #[error("Already on the first step")]
    NoPreviousStep,

    #[error("No step is active")]
    NotActive,

    #[error("Onboarding is no longer mounted")]
    Unmounted,

    #[error("Unknown onboarding step: {0}")]
    UnknownStep(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
