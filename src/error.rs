//! Error types
//!
//! None of these reach callers of the event store: mirror failures are logged
//! by the writer thread and config problems fall back to defaults.

use thiserror::Error;

/// Errors raised by a durable mirror implementation
#[derive(Debug, Error)]
pub enum MirrorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("mirror unavailable: {0}")]
    Unavailable(String),
}

impl From<crate::utils::AtomicError> for MirrorError {
    fn from(e: crate::utils::AtomicError) -> Self {
        match e {
            crate::utils::AtomicError::Io(io) => MirrorError::Io(io),
        }
    }
}

/// Result type for mirror operations
pub type MirrorResult<T> = Result<T, MirrorError>;

/// Errors raised while validating configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max stored events must be a positive integer, got {0}")]
    InvalidMaxEvents(String),
}
