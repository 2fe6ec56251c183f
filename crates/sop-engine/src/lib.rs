//! Game engine for State of Play.
//!
//! The [`evaluator`] decides what an action would do without touching state.
//! The [`GameEngine`] runs the pipeline around it: lock the game, load,
//! evaluate, apply, log, check for the end of the game, and persist in one
//! atomic write. The [`SessionManager`] creates, ends, and resets games on
//! top of the engine.

/// Actions an external actor can issue.
pub mod action;
/// Engine tunables.
pub mod config;
/// The action pipeline and per-game locking.
pub mod engine;
/// Error types for the engine.
pub mod error;
/// Pure action evaluation and read-only projections.
pub mod evaluator;
/// Bundled scenario configurations.
pub mod scenarios;
/// Game lifecycle management.
pub mod session;

pub use action::Action;
pub use config::EngineConfig;
pub use engine::{ActionResult, GameEngine};
pub use error::{GameError, GameResult};
pub use evaluator::projection::{AvailableAction, InventoryEntry};
pub use evaluator::{Acceptance, RejectReason, Rejection, Verdict, check_end, evaluate};
pub use session::{GameStatus, SessionManager};
