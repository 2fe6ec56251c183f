use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::delta::Change;
use crate::entity::ItemLocation;
use crate::id::{GameId, ItemId, RoomId};
use crate::state::GameState;

/// End-of-game report, computed once when a game ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSummary {
    /// The game reported on.
    pub game_id: GameId,
    /// Scenario title.
    pub title: String,
    /// `won`, `lost`, `ended`, or `active` for a running game.
    pub outcome: String,
    /// The condition that decided the game, if any.
    pub condition: Option<String>,
    /// Accepted actions after the start.
    pub turns: u64,
    /// Start room first, then every room entered, in first-visit order.
    pub rooms_visited: Vec<RoomId>,
    /// Every item that reached a player, in first-pickup order.
    pub items_collected: Vec<ItemId>,
    /// The first player's room when the game ended.
    pub final_location: Option<RoomId>,
    /// Messages of start, use, talk, and end entries.
    pub major_events: Vec<String>,
    /// When the game was started.
    pub started_at: DateTime<Utc>,
    /// When the game ended.
    pub ended_at: DateTime<Utc>,
    /// Whole seconds between start and end.
    pub duration_seconds: i64,
}

impl GameSummary {
    /// Project a summary from a state and its log.
    ///
    /// Depends only on the state, so calling it twice on the same state
    /// yields identical summaries.
    pub fn from_state(state: &GameState, max_events: usize) -> Self {
        let mut rooms_visited = vec![state.start_room.clone()];
        let mut items_collected = Vec::new();

        for change in state.event_log.iter().flat_map(|e| e.delta.changes()) {
            match change {
                Change::PlayerMoved { to, .. } if !rooms_visited.contains(to) => {
                    rooms_visited.push(to.clone());
                }
                Change::ItemMoved {
                    item,
                    to: ItemLocation::Player(_),
                    ..
                } if !items_collected.contains(item) => {
                    items_collected.push(item.clone());
                }
                _ => {}
            }
        }

        let major_events = state
            .event_log
            .iter()
            .filter(|e| e.action.is_major())
            .take(max_events)
            .map(|e| e.message.clone())
            .collect();

        let (outcome, condition) = match &state.outcome {
            Some(o) => (o.label().to_string(), o.condition().map(str::to_string)),
            None => ("active".to_string(), None),
        };

        Self {
            game_id: state.game_id.clone(),
            title: state.title.clone(),
            outcome,
            condition,
            turns: state.current_turn,
            rooms_visited,
            items_collected,
            final_location: state.primary_player().map(|p| p.location.clone()),
            major_events,
            started_at: state.created_at,
            ended_at: state.last_action_at,
            duration_seconds: (state.last_action_at - state.created_at).num_seconds(),
        }
    }
}
