//! Error types for coursekit.
//!
//! Library crates use [`CourseKitError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all coursekit operations.
#[derive(Debug, thiserror::Error)]
pub enum CourseKitError {
    /// Configuration loading or validation error (missing credentials, bad site URL).
    #[error("config error: {message}")]
    Config { message: String },

    /// Transport-level failure talking to a remote API.
    #[error("network error: {0}")]
    Network(String),

    /// A remote API answered with a non-success status.
    #[error("API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// Response or document parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (malformed event, unexpected path shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Cloud-provider call failed during remediation.
    #[error("remediation error: {0}")]
    Remediation(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, CourseKitError>;

impl CourseKitError {
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

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an API error from a status code and response body.
    pub fn api(status: u16, body: impl Into<String>) -> Self {
        Self::Api {
            status,
            body: body.into(),
        }
    }
}
