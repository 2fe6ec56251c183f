//! Repository contract for persisting game state.

use std::fmt;

use sop_core::{Flags, GameId, GameState, LogEntry};

use crate::error::StoreResult;
use crate::record::{EntityCollections, GameRecord};

/// Exclusive claim on one game, released when dropped.
///
/// Holders keep the claim from the load that reads a game to the save that
/// replaces it, so two writers never interleave on the same game.
#[must_use = "the claim is released as soon as it is dropped"]
pub struct GameLock {
    _held: Box<dyn Send>,
}

impl GameLock {
    /// Wrap whatever keeps the claim alive; dropping it releases the claim.
    pub fn new(held: impl Send + 'static) -> Self {
        Self {
            _held: Box::new(held),
        }
    }
}

impl fmt::Debug for GameLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GameLock")
    }
}

/// Durable storage for game records, keyed by game id.
///
/// Every write is all-or-nothing: a failed `save` or `append_log` leaves the
/// previously stored record readable and unchanged.
pub trait StateRepository: Send + Sync {
    /// Claim a game for exclusive writing, waiting until it is free.
    ///
    /// The game does not need to exist yet. Claims are not reentrant.
    fn lock_game(&self, game_id: &GameId) -> StoreResult<GameLock>;

    /// Replace the stored record for a game with the given state.
    fn save(&self, game_id: &GameId, state: &GameState) -> StoreResult<()>;

    /// Load the raw stored record.
    fn load_record(&self, game_id: &GameId) -> StoreResult<GameRecord>;

    /// Append one entry to a game's log.
    ///
    /// The entry's sequence must equal the current log length.
    fn append_log(&self, game_id: &GameId, entry: &LogEntry) -> StoreResult<()>;

    /// Check if a record exists.
    fn exists(&self, game_id: &GameId) -> StoreResult<bool>;

    /// Remove a record. Returns whether one existed.
    fn delete(&self, game_id: &GameId) -> StoreResult<bool>;

    /// Ids of every stored game, sorted.
    fn list_games(&self) -> StoreResult<Vec<GameId>>;

    /// Load the full state of a game, log included.
    fn load(&self, game_id: &GameId) -> StoreResult<GameState> {
        Ok(self.load_record(game_id)?.to_state())
    }

    /// The event log, oldest first.
    fn get_log(&self, game_id: &GameId) -> StoreResult<Vec<LogEntry>> {
        Ok(self.load_record(game_id)?.log)
    }

    /// Rooms, items, NPCs, and players without the rest of the state.
    fn load_collections(&self, game_id: &GameId) -> StoreResult<EntityCollections> {
        Ok(self.load_record(game_id)?.collections)
    }

    /// Global flags without the rest of the state.
    fn load_flags(&self, game_id: &GameId) -> StoreResult<Flags> {
        Ok(self.load_record(game_id)?.flags)
    }
}
