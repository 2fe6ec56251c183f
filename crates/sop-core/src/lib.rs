//! Core types for State of Play: rooms, items, NPCs, players, and the game state.
//!
//! This crate is the entity store. It parses and validates scenario
//! configurations, seeds a [`GameState`] from them, and defines the
//! structured [`Delta`] and [`LogEntry`] records every accepted action
//! produces. It performs no I/O beyond reading a scenario file.

/// Win and lose predicates.
pub mod condition;
/// Structured state changes and their application.
pub mod delta;
/// Rooms, items, NPCs, and players.
pub mod entity;
/// Error types used throughout the crate.
pub mod error;
/// Identifier newtypes.
pub mod id;
/// Append-only event log records.
pub mod log;
/// Access requirements and item-use effects.
pub mod rule;
/// Scenario configuration and validation.
pub mod scenario;
/// The aggregate game state.
pub mod state;
/// End-of-game summary projection.
pub mod summary;
/// Flag and property values.
pub mod value;

/// Re-export predicate types.
pub use condition::Condition;
/// Re-export change types.
pub use delta::{Change, Delta};
/// Re-export entity types.
pub use entity::{DialogueNode, Item, ItemLocation, Npc, Player, Room};
/// Re-export error types.
pub use error::{SchemaError, SchemaResult, StateError};
/// Re-export identifiers.
pub use id::{DEFAULT_PLAYER_ID, GameId, ItemId, NpcId, PlayerId, RoomId};
/// Re-export log types.
pub use log::{ActionKind, LogEntry};
/// Re-export rule types.
pub use rule::{AccessRequirement, Requirement, UseEffect};
/// Re-export scenario types.
pub use scenario::ScenarioConfig;
/// Re-export state types.
pub use state::{GameState, Outcome};
/// Re-export the summary type.
pub use summary::GameSummary;
/// Re-export value types.
pub use value::{FlagValue, Flags};
