//! Text tool adapter for State of Play.
//!
//! [`GameTools`] exposes one operation per player action, each taking loose
//! player-typed names and returning text. The [`parser`] turns a typed line
//! like `use sword on dragon` into a [`Command`] and resolves names with
//! fuzzy matching.

/// Error types for the adapter.
pub mod error;
/// Command parsing and name resolution.
pub mod parser;
/// The text tools.
pub mod tools;

pub use error::{ToolError, ToolResult};
pub use parser::{Command, Direction, parse_command};
pub use tools::{GameTools, render_status, render_summary};
