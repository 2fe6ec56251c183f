//! The game engine: validates, applies, logs, and persists actions.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sop_core::{
    ActionKind, Change, Delta, GameId, GameState, GameSummary, ItemId, LogEntry, Outcome, PlayerId,
    ScenarioConfig,
};
use sop_store::{BoundedRepository, GameLock, InMemoryRepository, StateRepository};

use crate::action::Action;
use crate::config::EngineConfig;
use crate::error::{GameError, GameResult};
use crate::evaluator::projection::{self, AvailableAction, InventoryEntry};
use crate::evaluator::{RejectReason, Verdict, check_end, evaluate};

/// What an action did, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult {
    /// Whether the action was accepted.
    pub success: bool,
    /// Narration or rejection text.
    pub message: String,
    /// Turn counter after the action.
    pub turn: u64,
    /// Messages of effects and conditions the action set off.
    pub triggered_events: Vec<String>,
    /// Set on rejection.
    pub reason: Option<RejectReason>,
    /// Set when this action ended the game.
    pub outcome: Option<Outcome>,
    /// End-of-game report, when the action ended the game.
    pub summary: Option<GameSummary>,
}

impl ActionResult {
    fn unchanged(state: &GameState, message: String, reason: Option<RejectReason>) -> Self {
        Self {
            success: reason.is_none(),
            message,
            turn: state.current_turn,
            triggered_events: Vec::new(),
            reason,
            outcome: None,
            summary: None,
        }
    }
}

/// Runs the action pipeline against a repository.
///
/// The engine keeps no game state of its own. Every operation that changes a
/// game claims it through [`StateRepository::lock_game`] and then loads it, so
/// engines sharing a repository (or a directory, across processes) never act
/// on a stale copy.
pub struct GameEngine {
    repository: Arc<dyn StateRepository>,
    config: EngineConfig,
}

impl GameEngine {
    /// Create an engine over an existing repository.
    pub fn new(repository: Arc<dyn StateRepository>, config: EngineConfig) -> Self {
        Self { repository, config }
    }

    /// Create an engine whose repository calls are bounded by
    /// `config.persistence_timeout`.
    pub fn bounded(repository: Arc<dyn StateRepository>, config: EngineConfig) -> Self {
        let bounded = BoundedRepository::new(repository, config.persistence_timeout);
        Self::new(Arc::new(bounded), config)
    }

    /// Create an engine over a fresh in-memory repository.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRepository::new()), EngineConfig::default())
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Validate a scenario, seed a game under `game_id`, and persist it with
    /// its "game started" entry in one write. Any previous game under the
    /// same id is replaced; if the write fails it stays as it was.
    pub fn start(
        &self,
        game_id: &GameId,
        scenario: &ScenarioConfig,
        player_name: Option<&str>,
    ) -> GameResult<GameState> {
        let name = player_name.unwrap_or(&self.config.default_player_name);
        let _claim = self.claim(game_id)?;
        self.seed(game_id, scenario, name)
    }

    /// Start a stored game over from its own scenario, keeping the player's
    /// name. The old game is only replaced once the new one is written.
    pub fn restart(&self, game_id: &GameId) -> GameResult<GameState> {
        let _claim = self.claim(game_id)?;
        let previous = self.repository.load(game_id)?;
        let name = previous
            .primary_player()
            .map_or_else(|| self.config.default_player_name.clone(), |p| p.name.clone());
        let state = self.seed(game_id, &previous.scenario, &name)?;
        tracing::info!(game = %game_id, "game restarted");
        Ok(state)
    }

    fn claim(&self, game_id: &GameId) -> GameResult<GameLock> {
        Ok(self.repository.lock_game(game_id)?)
    }

    // Callers hold the game's claim.
    fn seed(&self, game_id: &GameId, scenario: &ScenarioConfig, player_name: &str) -> GameResult<GameState> {
        let mut state = scenario.build(game_id.clone(), player_name)?;
        let actor = state
            .primary_player()
            .map(|p| p.id.clone())
            .ok_or_else(|| GameError::InvalidState("scenario produced no player".to_string()))?;
        let message = format!("Started new game: {}", state.title);
        let now = state.created_at;
        state.record(actor, ActionKind::StartGame, message, Delta::new(), now);

        self.repository.save(game_id, &state).inspect_err(|e| {
            tracing::warn!(game = %game_id, error = %e, "failed to save new game");
        })?;
        tracing::info!(game = %game_id, title = %state.title, "game started");
        Ok(state)
    }

    /// Run one action through the pipeline while holding the game's claim.
    ///
    /// Rejections and queries leave the state, turn, and log untouched. An
    /// accepted action is applied to a copy of the stored state, logged,
    /// checked for the end of the game, and saved in one write; if the save
    /// fails the copy is dropped and the stored state stays as it was.
    pub fn act(&self, game_id: &GameId, actor: &PlayerId, action: &Action) -> GameResult<ActionResult> {
        let _claim = self.claim(game_id)?;
        let state = self.repository.load(game_id)?;
        if state.is_ended() {
            return Err(GameError::InvalidState(format!("game {game_id} has ended")));
        }

        let acceptance = match evaluate(&state, actor, action)? {
            Verdict::Rejected(rejection) => {
                tracing::debug!(game = %game_id, reason = ?rejection.reason, "action rejected");
                return Ok(ActionResult::unchanged(&state, rejection.message, Some(rejection.reason)));
            }
            Verdict::Accepted(acceptance) => acceptance,
        };
        let Some(kind) = action.kind() else {
            return Ok(ActionResult::unchanged(&state, acceptance.message, None));
        };

        let now = Utc::now();
        let mut next = state.clone();
        acceptance.delta.apply(&mut next)?;
        next.last_action_at = now;
        next.record(
            actor.clone(),
            kind,
            describe(&state, actor, action),
            acceptance.delta.clone(),
            now,
        );

        let outcome = acceptance.ends_game.clone().or_else(|| check_end(&next, actor));
        if let Some(outcome) = &outcome {
            self.finish(&mut next, actor, outcome.clone(), now)?;
        }

        let violations = next.check_invariants();
        if !violations.is_empty() {
            return Err(GameError::InvalidState(violations.join("; ")));
        }

        self.repository.save(game_id, &next).inspect_err(|e| {
            tracing::warn!(game = %game_id, error = %e, "failed to save action; state unchanged");
        })?;
        tracing::debug!(game = %game_id, turn = next.current_turn, action = %kind, "action applied");
        if let Some(outcome) = &outcome {
            tracing::info!(game = %game_id, %outcome, "game over");
        }

        let mut message = acceptance.message;
        if let Some(Outcome::Won { .. }) = &outcome {
            message.push_str("\nYou have won!");
        } else if let Some(Outcome::Lost { .. }) = &outcome {
            message.push_str("\nYou have lost.");
        }
        let result = ActionResult {
            success: true,
            message,
            turn: next.current_turn,
            triggered_events: acceptance.triggered_events,
            reason: None,
            outcome,
            summary: next.summary,
        };
        Ok(result)
    }

    /// End an active game explicitly and return its summary.
    pub fn end(&self, game_id: &GameId, reason: &str) -> GameResult<GameSummary> {
        let _claim = self.claim(game_id)?;
        let mut next = self.repository.load(game_id)?;
        if next.is_ended() {
            return Err(GameError::InvalidState(format!("game {game_id} has already ended")));
        }
        let actor = next
            .primary_player()
            .map(|p| p.id.clone())
            .ok_or_else(|| GameError::InvalidState(format!("game {game_id} has no player")))?;

        let now = Utc::now();
        next.last_action_at = now;
        let outcome = Outcome::Ended {
            reason: reason.to_string(),
        };
        let summary = self.finish(&mut next, &actor, outcome, now)?;

        self.repository.save(game_id, &next).inspect_err(|e| {
            tracing::warn!(game = %game_id, error = %e, "failed to save ended game");
        })?;
        tracing::info!(game = %game_id, reason, "game ended");
        Ok(summary)
    }

    /// Mark the game over, log it, and attach the summary.
    fn finish(
        &self,
        state: &mut GameState,
        actor: &PlayerId,
        outcome: Outcome,
        now: DateTime<Utc>,
    ) -> GameResult<GameSummary> {
        let message = match &outcome {
            Outcome::Won { condition } => format!("Game won: {condition}"),
            Outcome::Lost { condition } => format!("Game lost: {condition}"),
            Outcome::Ended { reason } => format!("Game ended: {reason}"),
        };
        let delta = Delta::from(vec![Change::GameEnded { outcome }]);
        delta.apply(state)?;
        state.record(actor.clone(), ActionKind::EndGame, message, delta, now);

        let summary = GameSummary::from_state(state, self.config.summary_event_limit);
        state.summary = Some(summary.clone());
        Ok(summary)
    }

    /// The summary attached when the game ended. Identical on every call.
    pub fn summary(&self, game_id: &GameId) -> GameResult<GameSummary> {
        self.snapshot(game_id)?
            .summary
            .ok_or_else(|| GameError::InvalidState(format!("game {game_id} is still active")))
    }

    /// The stored state.
    pub fn snapshot(&self, game_id: &GameId) -> GameResult<GameState> {
        Ok(self.repository.load(game_id)?)
    }

    /// The stored event log, oldest first.
    pub fn log(&self, game_id: &GameId) -> GameResult<Vec<LogEntry>> {
        Ok(self.repository.get_log(game_id)?)
    }

    /// Describe the player's current room.
    pub fn look_around(&self, game_id: &GameId, actor: &PlayerId) -> GameResult<String> {
        projection::look_around(&self.snapshot(game_id)?, actor)
    }

    /// The player's carried items.
    pub fn inventory(&self, game_id: &GameId, actor: &PlayerId) -> GameResult<Vec<InventoryEntry>> {
        projection::inventory(&self.snapshot(game_id)?, actor)
    }

    /// Actions that would be accepted right now. Empty once the game ended.
    pub fn available_actions(&self, game_id: &GameId, actor: &PlayerId) -> GameResult<Vec<AvailableAction>> {
        let state = self.snapshot(game_id)?;
        if state.is_ended() {
            return Ok(Vec::new());
        }
        projection::available_actions(&state, actor)
    }

    /// Whether a game is stored under this id.
    pub fn exists(&self, game_id: &GameId) -> GameResult<bool> {
        Ok(self.repository.exists(game_id)?)
    }

    /// Ids of every stored game. Claims no game.
    pub fn list_games(&self) -> GameResult<Vec<GameId>> {
        Ok(self.repository.list_games()?)
    }

    /// Remove a game. Returns whether it existed.
    pub fn delete(&self, game_id: &GameId) -> GameResult<bool> {
        let _claim = self.claim(game_id)?;
        let existed = self.repository.delete(game_id)?;
        if existed {
            tracing::info!(game = %game_id, "game deleted");
        }
        Ok(existed)
    }
}

/// Log line for an accepted action.
fn describe(state: &GameState, actor: &PlayerId, action: &Action) -> String {
    let item_name = |id: &ItemId| state.item(id).map_or_else(|| id.to_string(), |i| i.name.clone());
    match action {
        Action::Move { direction } => {
            let target = state
                .player(actor)
                .and_then(|p| state.room(&p.location))
                .and_then(|r| r.exit(direction))
                .and_then(|(_, target)| state.room(target))
                .map_or_else(|| direction.clone(), |r| r.name.clone());
            format!("Moved {direction} to {target}")
        }
        Action::Take { item } => format!("Took {}", item_name(item)),
        Action::Drop { item } => format!("Dropped {}", item_name(item)),
        Action::Use { item, target } => match target {
            Some(target) => format!("Used {} on {target}", item_name(item)),
            None => format!("Used {}", item_name(item)),
        },
        Action::Talk { npc, .. } => {
            let name = state.npc(npc).map_or_else(|| npc.to_string(), |n| n.name.clone());
            format!("Talked to {name}")
        }
        Action::LookAround | Action::CheckInventory | Action::GetAvailableActions => String::new(),
    }
}
