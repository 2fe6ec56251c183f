use std::time::Duration;

use sop_core::GameId;

/// Alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors surfaced by repository implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the game.
    #[error("game not found: {0}")]
    NotFound(GameId),

    /// The id cannot be used as a storage key.
    #[error("invalid game id \"{0}\"")]
    InvalidId(String),

    /// A thread panicked while holding an internal lock.
    #[error("repository lock was poisoned")]
    LockPoisoned,

    /// Reading or writing the backing files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A stored record could not be encoded or decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Stored data violates an ordering or shape guarantee.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// The backend did not answer within the configured bound.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        /// Repository operation name.
        operation: &'static str,
        /// Configured bound.
        after: Duration,
    },

    /// The worker running the operation went away without answering.
    #[error("{0} worker exited without a result")]
    WorkerLost(&'static str),
}
