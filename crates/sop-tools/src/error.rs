//! Error types for the tool adapter.

use sop_engine::GameError;
use thiserror::Error;

/// Result type for tool operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Failures the adapter turns into text for the caller.
#[derive(Debug, Error)]
pub enum ToolError {
    /// No game has been started in this session.
    #[error("No active game. Start a new game first.")]
    NoActiveGame,

    /// The typed command could not be understood.
    #[error("I don't understand \"{0}\". Type 'help' for a list of commands.")]
    UnknownCommand(String),

    /// The engine refused the operation.
    #[error("{0}")]
    Game(#[from] GameError),
}
