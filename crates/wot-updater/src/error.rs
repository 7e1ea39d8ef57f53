//! Error types for the update coordinator

use thiserror::Error;

/// Result type alias for coordinator operations
pub type Result<T> = std::result::Result<T, UpdaterError>;

/// Errors raised by the coordinator itself.
///
/// Backend failures never show up here: they are absorbed by the job that
/// hit them and reported through its completion latch.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// Trust score outside of [-100, 100]
    #[error("Invalid trust score: {0} (expected -100..=100)")]
    InvalidTrustScore(i32),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// `start()` called on a coordinator whose worker is already running
    #[error("Update worker already started")]
    AlreadyStarted,

    /// `start()` called after the coordinator was stopped
    #[error("Update coordinator has been stopped")]
    Terminated,

    /// The worker thread could not be spawned
    #[error("Failed to spawn update worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    /// The worker thread panicked before it could be joined
    #[error("Update worker panicked")]
    WorkerPanicked,
}

/// Failure reported by a [`crate::ports::WebOfTrustConnector`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ConnectorError {
    /// The backend rejected or failed the operation
    #[error("Backend fault during {operation}: {reason}")]
    BackendFault {
        /// Connector operation that failed
        operation: &'static str,
        /// Backend supplied reason
        reason: String,
    },

    /// The backend could not be reached at all
    #[error("Backend unavailable: {0}")]
    Unavailable(String),
}

impl ConnectorError {
    /// Shorthand for a [`ConnectorError::BackendFault`]
    pub fn fault(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::BackendFault {
            operation,
            reason: reason.into(),
        }
    }

    /// Every connector error is a backend fault from the coordinator's view;
    /// kept as a predicate so callers do not match on variants.
    pub fn is_backend_fault(&self) -> bool {
        matches!(self, Self::BackendFault { .. } | Self::Unavailable(_))
    }
}
