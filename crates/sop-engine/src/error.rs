//! Error types for the game engine.

use sop_core::{GameId, PlayerId, SchemaError, StateError};
use sop_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type GameResult<T> = Result<T, GameError>;

/// Errors that stop an operation before any state changes.
///
/// A rule the player fails to meet is not an error; it comes back as a
/// rejected verdict.
#[derive(Debug, Error)]
pub enum GameError {
    /// The scenario configuration is invalid.
    #[error("invalid scenario: {0}")]
    Schema(#[from] SchemaError),

    /// No game exists under this id.
    #[error("game not found: {0}")]
    NotFound(GameId),

    /// The acting player does not exist in the game.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The operation is not valid in the game's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The repository failed; the durable state is unchanged.
    #[error("persistence failure: {0}")]
    Persistence(StoreError),
}

impl From<StoreError> for GameError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Persistence(other),
        }
    }
}

impl From<StateError> for GameError {
    fn from(err: StateError) -> Self {
        Self::InvalidState(err.to_string())
    }
}
