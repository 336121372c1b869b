//! Error types

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Main error type for hxcomm-context
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error on the underlying transport
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Invalid configuration or connection arguments
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Required information missing from or malformed in the environment
    #[error("environment error: {0}")]
    Environment(String),

    /// Establishing the transport took longer than the configured timeout
    #[error("connecting to {endpoint} timed out after {timeout:?}")]
    ConnectTimeout {
        /// Endpoint that did not answer
        endpoint: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// All connection attempts to a daemon failed
    #[error("gave up connecting to {endpoint} after {attempts} attempts")]
    AttemptsExhausted {
        /// Endpoint that could not be reached
        endpoint: String,
        /// Number of attempts made
        attempts: usize,
        /// Failure of the last attempt
        #[source]
        source: Box<Error>,
    },

    /// Connection was closed
    #[error("connection closed")]
    ConnectionClosed,

    /// Operation not valid in the current state
    #[error("invalid state: expected {expected}, got {actual}")]
    InvalidState {
        /// Expected state
        expected: String,
        /// Actual state
        actual: String,
    },
}

impl Error {
    /// Stable short label for this error, used in logs and metrics
    pub fn category(&self) -> &'static str {
        match self {
            Error::Io(_) => "io",
            Error::Config(_) => "config",
            Error::Environment(_) => "environment",
            Error::ConnectTimeout { .. } => "timeout",
            Error::AttemptsExhausted { .. } => "attempts_exhausted",
            Error::ConnectionClosed => "closed",
            Error::InvalidState { .. } => "invalid_state",
        }
    }

    /// Whether retrying the same connection may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::Io(_) | Error::ConnectTimeout { .. } | Error::ConnectionClosed
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
