//! Error types for the Appdeck core library.
//!
//! Only pipeline-level failures live here. Per-candidate fetch problems are
//! modelled separately by [`crate::icons::FetchFailure`] and are absorbed by
//! the resolver.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the Appdeck core library.
#[derive(Debug, Error)]
pub enum IconError {
    // Input validation
    #[error("Invalid target URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid params: {message}")]
    InvalidParams { message: String },

    #[error("Invalid data URL: {message}")]
    InvalidDataUrl { message: String },

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Request timed out: {message}")]
    Timeout {
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    #[error("Icon resolution cancelled")]
    Cancelled,

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Icon not found: {name}")]
    IconNotFound { name: String },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    // Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    // Generic errors
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Appdeck operations.
pub type Result<T> = std::result::Result<T, IconError>;

impl From<std::io::Error> for IconError {
    fn from(err: std::io::Error) -> Self {
        IconError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<serde_json::Error> for IconError {
    fn from(err: serde_json::Error) -> Self {
        IconError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for IconError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IconError::Timeout {
                message: err.to_string(),
                source: Some(err),
            }
        } else {
            IconError::Network {
                message: err.to_string(),
                source: Some(err),
            }
        }
    }
}

impl IconError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        IconError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a validation error for a malformed target URL.
    pub fn invalid_url(url: &str, reason: impl Into<String>) -> Self {
        IconError::InvalidUrl {
            url: url.to_string(),
            reason: reason.into(),
        }
    }

    /// Convert to a JSON-RPC error code.
    ///
    /// Custom error codes (application-defined, -32000 to -32099):
    /// - -32000: Network/connectivity error
    /// - -32002: Stored icon not found
    /// - -32003: Persistence failed
    /// - -32004: Cancelled by user
    /// - -32005: Validation error
    pub fn to_rpc_error_code(&self) -> i32 {
        match self {
            IconError::Network { .. } | IconError::Timeout { .. } => -32000,

            IconError::IconNotFound { .. } => -32002,

            IconError::Io { .. } => -32003,

            IconError::Cancelled => -32004,

            IconError::InvalidUrl { .. }
            | IconError::InvalidParams { .. }
            | IconError::InvalidDataUrl { .. } => -32005,

            _ => -32603,
        }
    }

    /// Whether this error was caused by the caller's input rather than the environment.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            IconError::InvalidUrl { .. }
                | IconError::InvalidParams { .. }
                | IconError::InvalidDataUrl { .. }
        )
    }
}
