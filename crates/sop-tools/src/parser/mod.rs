//! Command parsing and name resolution.

mod command;
mod resolver;

pub use command::{Command, Direction, normalize_direction, parse_command};
pub use resolver::{Candidate, fuzzy_match, resolve, resolve_exact, suggest};
