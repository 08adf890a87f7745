//! Error types for DealScout.
//!
//! Library crates use [`DealScoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all DealScout operations.
#[derive(Debug, thiserror::Error)]
pub enum DealScoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure (connect, timeout, body read).
    #[error("network error: {0}")]
    Network(String),

    /// A backend answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Malformed backend response or unparseable text.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (bad URL, empty company name, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DealScoutError>;

impl DealScoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create an API error from a status code and response body.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = DealScoutError::config("missing API key");
        assert_eq!(err.to_string(), "config error: missing API key");

        let err = DealScoutError::api(429, "slow down");
        assert_eq!(err.to_string(), "API error (status 429): slow down");
    }
}
