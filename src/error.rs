//! Error types for the Fractal registry client
//!
//! Every failure carries a distinguishing kind. The facade flattens all of
//! them into a single `Status::Error`, the kind survives for logging and tests.

use thiserror::Error;

/// Result type alias using FractalError
pub type Result<T> = std::result::Result<T, FractalError>;

/// Unified error type for client and node operations
#[derive(Debug, Error)]
pub enum FractalError {
    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to resolve host '{host}': {reason}")]
    Resolution { host: String, reason: String },

    // -------------------------------------------------------------------------
    // Routing Errors
    // -------------------------------------------------------------------------
    #[error("Routing error: {0}")]
    Routing(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Remote call timed out: {0}")]
    Timeout(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Remote error {code}: {message}")]
    Remote { code: i64, message: String },

    #[error("{method} on {node} failed ({kind:?})")]
    CallFailed {
        method: String,
        node: String,
        kind: ErrorKind,
    },

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Coarse classification of a [`FractalError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Resolution,
    Routing,
    Transport,
    Timeout,
    Protocol,
    Remote,
    Decode,
}

impl FractalError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FractalError::Config(_) => ErrorKind::Configuration,
            FractalError::Resolution { .. } => ErrorKind::Resolution,
            FractalError::Routing(_) => ErrorKind::Routing,
            FractalError::Io(e) => match e.kind() {
                std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => ErrorKind::Timeout,
                _ => ErrorKind::Transport,
            },
            FractalError::Timeout(_) => ErrorKind::Timeout,
            FractalError::Protocol(_) => ErrorKind::Protocol,
            FractalError::Remote { .. } => ErrorKind::Remote,
            FractalError::CallFailed { kind, .. } => *kind,
            FractalError::Serialization(_) => ErrorKind::Protocol,
            FractalError::Decode(_) => ErrorKind::Decode,
        }
    }
}
