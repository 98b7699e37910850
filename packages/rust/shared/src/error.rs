//! Error types for Leadloom.
//!
//! Library crates use [`LeadloomError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The taxonomy follows the run's failure model: [`LeadloomError::Transient`]
//! is retried by the backoff helper, [`LeadloomError::Config`] aborts the run
//! before any item is processed, and everything else is item-fatal — caught at
//! the driver's per-item boundary and turned into a logged failure outcome.

use std::path::PathBuf;

/// Top-level error type for all Leadloom operations.
#[derive(Debug, thiserror::Error)]
pub enum LeadloomError {
    /// Configuration loading or validation error (run-fatal).
    #[error("config error: {message}")]
    Config { message: String },

    /// Transient service error (network failure, HTTP 5xx/429). Retried.
    #[error("transient error: {0}")]
    Transient(String),

    /// Terminal network/HTTP error (non-retryable status, malformed response).
    #[error("network error: {0}")]
    Network(String),

    /// HTML or payload parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// Data validation error (bad URL, bad recipient, missing draft fields).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The run exceeded its step budget or wall-clock deadline.
    #[error("budget exceeded: {message}")]
    Budget { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LeadloomError>;

impl LeadloomError {
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

    /// Create a budget error from any displayable message.
    pub fn budget(msg: impl Into<String>) -> Self {
        Self::Budget {
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

    /// Whether the retry helper should retry after this error.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}
