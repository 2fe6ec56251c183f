//! The unit of persistence: one record per game.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use sop_core::{Flags, GameState, Item, ItemId, LogEntry, Npc, NpcId, Player, PlayerId, Room, RoomId};

use crate::error::{StoreError, StoreResult};

/// Per-type entity collections, stored alongside the snapshot for fast lookups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityCollections {
    /// Rooms by id.
    pub rooms: BTreeMap<RoomId, Room>,
    /// Items by id.
    pub items: BTreeMap<ItemId, Item>,
    /// NPCs by id.
    pub npcs: BTreeMap<NpcId, Npc>,
    /// Players by id.
    pub players: BTreeMap<PlayerId, Player>,
}

/// Everything persisted for one game, written as a single unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Full state without its log.
    pub snapshot: GameState,
    /// Entity maps, stored beside the snapshot.
    pub collections: EntityCollections,
    /// Global flags.
    pub flags: Flags,
    /// Event log, oldest first.
    pub log: Vec<LogEntry>,
}

impl GameRecord {
    /// Split a state into its stored parts.
    pub fn from_state(state: &GameState) -> Self {
        let mut snapshot = state.clone();
        let log = std::mem::take(&mut snapshot.event_log);
        Self {
            collections: EntityCollections {
                rooms: state.rooms.clone(),
                items: state.items.clone(),
                npcs: state.npcs.clone(),
                players: state.players.clone(),
            },
            flags: state.global_flags.clone(),
            snapshot,
            log,
        }
    }

    /// Reassemble the state, log included.
    pub fn to_state(&self) -> GameState {
        let mut state = self.snapshot.clone();
        state.event_log = self.log.clone();
        state
    }

    /// Append one entry, refusing anything but the next sequence number.
    pub fn append(&mut self, entry: LogEntry) -> StoreResult<()> {
        let expected = self.log.len() as u64;
        if entry.sequence != expected {
            return Err(StoreError::Corrupted(format!(
                "log entry sequence {} does not follow {} existing entries",
                entry.sequence, expected
            )));
        }
        self.log.push(entry);
        Ok(())
    }
}
