//! Append-only game event log.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::Delta;
use crate::id::PlayerId;

/// The kind of event a log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// The game was created.
    StartGame,
    /// A player moved through an exit.
    Move,
    /// A player picked up an item.
    Take,
    /// A player put down an item.
    Drop,
    /// A player used an item.
    Use,
    /// A player talked to an NPC.
    Talk,
    /// The game ended.
    EndGame,
}

impl ActionKind {
    /// The snake_case name used in logs and tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StartGame => "start_game",
            Self::Move => "move",
            Self::Take => "take",
            Self::Drop => "drop",
            Self::Use => "use",
            Self::Talk => "talk",
            Self::EndGame => "end_game",
        }
    }

    /// Whether entries of this kind count as major events in a summary.
    pub fn is_major(&self) -> bool {
        matches!(
            self,
            Self::StartGame | Self::Use | Self::Talk | Self::EndGame
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// When the entry was recorded.
    pub timestamp: DateTime<Utc>,
    /// Turn counter after the event.
    pub turn: u64,
    /// Player who caused the event.
    pub actor: PlayerId,
    /// Event kind.
    pub action: ActionKind,
    /// Human-readable description.
    pub message: String,
    /// Structured changes.
    pub delta: Delta,
}
