//! Errors reported at the command line.

use miette::Diagnostic;
use sop_core::{GameId, SchemaError};
use sop_engine::GameError;
use sop_store::StoreError;
use thiserror::Error;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Everything a command can fail with.
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("unknown scenario '{0}'")]
    #[diagnostic(code(sop::unknown_scenario), help("run `sop scenarios` to list the bundled ones"))]
    UnknownScenario(String),

    #[error("no saved game '{0}'")]
    #[diagnostic(code(sop::no_game), help("start one with `sop new`, or list saved games with `sop games`"))]
    NoGame(GameId),

    #[error("game '{0}' is still running")]
    #[diagnostic(code(sop::still_active), help("end it first with `sop end`"))]
    StillActive(GameId),

    #[error("invalid scenario: {0}")]
    #[diagnostic(code(sop::scenario))]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    #[diagnostic(code(sop::game))]
    Game(GameError),

    #[error("save directory: {0}")]
    #[diagnostic(code(sop::store))]
    Store(#[from] StoreError),

    #[error("failed to encode output")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<GameError> for CliError {
    fn from(err: GameError) -> Self {
        match err {
            GameError::NotFound(id) => Self::NoGame(id),
            GameError::Schema(e) => Self::Schema(e),
            other => Self::Game(other),
        }
    }
}
