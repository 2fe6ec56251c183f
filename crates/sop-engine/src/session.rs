//! Game lifecycle: creating, ending, resetting, and tracking the current game.

use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use sop_core::{GameId, GameState, GameSummary, ScenarioConfig};

use crate::engine::GameEngine;
use crate::error::GameResult;

/// A short status line for one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStatus {
    /// The game.
    pub game_id: GameId,
    /// Scenario title.
    pub title: String,
    /// Current turn.
    pub turn: u64,
    /// Whether actions are still accepted.
    pub active: bool,
    /// `won`, `lost`, or `ended` once the game is over.
    pub outcome: Option<String>,
    /// First player's name.
    pub player_name: Option<String>,
    /// Display name of the player's room.
    pub location: Option<String>,
    /// Items the first player carries.
    pub inventory_count: usize,
    /// Entries in the event log.
    pub log_length: usize,
}

impl GameStatus {
    fn from_state(state: &GameState) -> Self {
        let player = state.primary_player();
        Self {
            game_id: state.game_id.clone(),
            title: state.title.clone(),
            turn: state.current_turn,
            active: state.active,
            outcome: state.outcome.as_ref().map(|o| o.label().to_string()),
            player_name: player.map(|p| p.name.clone()),
            location: player
                .and_then(|p| state.room(&p.location))
                .map(|r| r.name.clone()),
            inventory_count: player.map_or(0, |p| p.inventory.len()),
            log_length: state.event_log.len(),
        }
    }
}

/// Creates and retires games, and remembers which one adapters act on.
pub struct SessionManager {
    engine: Arc<GameEngine>,
    current: RwLock<Option<GameId>>,
}

impl SessionManager {
    /// Wrap an engine.
    pub fn new(engine: Arc<GameEngine>) -> Self {
        Self {
            engine,
            current: RwLock::new(None),
        }
    }

    /// The underlying engine.
    pub fn engine(&self) -> &Arc<GameEngine> {
        &self.engine
    }

    /// Start a game under a freshly generated id and make it current.
    pub fn start_new_game(&self, scenario: &ScenarioConfig, player_name: Option<&str>) -> GameResult<GameId> {
        self.start_game_with_id(GameId::generate(), scenario, player_name)
    }

    /// Start a game under a fixed id, replacing any game stored there, and
    /// make it current.
    pub fn start_game_with_id(
        &self,
        game_id: GameId,
        scenario: &ScenarioConfig,
        player_name: Option<&str>,
    ) -> GameResult<GameId> {
        self.engine.start(&game_id, scenario, player_name)?;
        self.set_current_game(game_id.clone());
        Ok(game_id)
    }

    /// End a game and return its summary.
    pub fn end_game(&self, game_id: &GameId, reason: &str) -> GameResult<GameSummary> {
        self.engine.end(game_id, reason)
    }

    /// Restart a game from its original scenario under the same id.
    ///
    /// The player keeps their name; everything else returns to turn 0.
    /// If the new game cannot be written, the old one stays in place.
    pub fn reset_game(&self, game_id: &GameId) -> GameResult<GameState> {
        self.engine.restart(game_id)
    }

    /// The game adapters act on when none is named.
    pub fn current_game(&self) -> Option<GameId> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Change the current game.
    pub fn set_current_game(&self, game_id: GameId) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(game_id);
    }

    /// Status of a stored game.
    pub fn status(&self, game_id: &GameId) -> GameResult<GameStatus> {
        Ok(GameStatus::from_state(&self.engine.snapshot(game_id)?))
    }
}
