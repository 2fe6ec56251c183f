use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::delta::Delta;
use crate::entity::{Item, ItemLocation, Npc, Player, Room};
use crate::error::StateError;
use crate::id::{GameId, ItemId, NpcId, PlayerId, RoomId};
use crate::log::{ActionKind, LogEntry};
use crate::scenario::ScenarioConfig;
use crate::summary::GameSummary;
use crate::value::Flags;

/// How a game ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    /// A win condition (or a win effect) fired.
    Won {
        /// The satisfied condition.
        condition: String,
    },
    /// A lose condition fired.
    Lost {
        /// The satisfied condition.
        condition: String,
    },
    /// The game was ended explicitly.
    Ended {
        /// Caller-supplied reason.
        reason: String,
    },
}

impl Outcome {
    /// Short outcome label: `won`, `lost`, or `ended`.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Won { .. } => "won",
            Self::Lost { .. } => "lost",
            Self::Ended { .. } => "ended",
        }
    }

    /// The condition that decided the game, if any.
    pub fn condition(&self) -> Option<&str> {
        match self {
            Self::Won { condition } | Self::Lost { condition } => Some(condition),
            Self::Ended { .. } => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Won { condition } => write!(f, "won ({condition})"),
            Self::Lost { condition } => write!(f, "lost ({condition})"),
            Self::Ended { reason } => write!(f, "ended ({reason})"),
        }
    }
}

/// The aggregate root: one complete game world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Identifier this game is stored under.
    pub game_id: GameId,
    /// Scenario title.
    pub title: String,
    /// Scenario introduction.
    pub description: String,
    /// Incremented once per accepted action.
    pub current_turn: u64,
    /// False once the game has ended; the state is then read-only.
    pub active: bool,
    /// Room players start in.
    pub start_room: RoomId,
    /// Players by id.
    pub players: BTreeMap<PlayerId, Player>,
    /// Rooms by id.
    pub rooms: BTreeMap<RoomId, Room>,
    /// Items by id.
    pub items: BTreeMap<ItemId, Item>,
    /// NPCs by id.
    pub npcs: BTreeMap<NpcId, Npc>,
    /// Game-wide flags.
    pub global_flags: Flags,
    /// Conditions that win the game.
    pub win_conditions: Vec<Condition>,
    /// Conditions that lose the game.
    pub lose_conditions: Vec<Condition>,
    /// Every accepted action, in order.
    pub event_log: Vec<LogEntry>,
    /// When the game was started.
    pub created_at: DateTime<Utc>,
    /// When the last action was accepted.
    pub last_action_at: DateTime<Utc>,
    /// How the game ended; `None` while it runs.
    pub outcome: Option<Outcome>,
    /// Report computed when the game ended.
    pub summary: Option<GameSummary>,
    /// The configuration this game was seeded from.
    pub scenario: ScenarioConfig,
}

impl GameState {
    /// Get a player by id.
    pub fn player(&self, id: &PlayerId) -> Option<&Player> {
        self.players.get(id)
    }

    /// The first player, used when a caller does not name one.
    pub fn primary_player(&self) -> Option<&Player> {
        self.players.values().next()
    }

    /// Get a room by id.
    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Get an item by id.
    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    /// Get an NPC by id.
    pub fn npc(&self, id: &NpcId) -> Option<&Npc> {
        self.npcs.get(id)
    }

    /// Whether the game has ended.
    pub fn is_ended(&self) -> bool {
        !self.active
    }

    /// Append an entry to the in-memory log, numbering it.
    pub fn record(
        &mut self,
        actor: PlayerId,
        action: ActionKind,
        message: impl Into<String>,
        delta: Delta,
        timestamp: DateTime<Utc>,
    ) -> &LogEntry {
        let entry = LogEntry {
            sequence: self.event_log.len() as u64,
            timestamp,
            turn: self.current_turn,
            actor,
            action,
            message: message.into(),
            delta,
        };
        self.event_log.push(entry);
        &self.event_log[self.event_log.len() - 1]
    }

    /// Remove an item from the container named by `from`.
    pub(crate) fn detach_item(&mut self, item: &ItemId, from: &ItemLocation) -> Result<(), StateError> {
        match from {
            ItemLocation::Room(room) => {
                let room = self
                    .rooms
                    .get_mut(room)
                    .ok_or_else(|| StateError::RoomNotFound(room.clone()))?;
                room.items.remove(item);
            }
            ItemLocation::Player(player) => {
                let player = self
                    .players
                    .get_mut(player)
                    .ok_or_else(|| StateError::PlayerNotFound(player.clone()))?;
                player.remove_item(item);
            }
            ItemLocation::Npc(npc) => {
                let npc = self
                    .npcs
                    .get_mut(npc)
                    .ok_or_else(|| StateError::NpcNotFound(npc.clone()))?;
                npc.inventory.retain(|id| id != item);
            }
            ItemLocation::Assembled | ItemLocation::Unplaced => {}
        }
        Ok(())
    }

    /// Add an item to the container named by `to`.
    pub(crate) fn attach_item(&mut self, item: &ItemId, to: &ItemLocation) -> Result<(), StateError> {
        match to {
            ItemLocation::Room(room) => {
                let room = self
                    .rooms
                    .get_mut(room)
                    .ok_or_else(|| StateError::RoomNotFound(room.clone()))?;
                room.items.insert(item.clone());
            }
            ItemLocation::Player(player) => {
                let player = self
                    .players
                    .get_mut(player)
                    .ok_or_else(|| StateError::PlayerNotFound(player.clone()))?;
                player.add_item(item.clone());
            }
            ItemLocation::Npc(npc) => {
                let npc = self
                    .npcs
                    .get_mut(npc)
                    .ok_or_else(|| StateError::NpcNotFound(npc.clone()))?;
                if !npc.inventory.contains(item) {
                    npc.inventory.push(item.clone());
                }
            }
            ItemLocation::Assembled | ItemLocation::Unplaced => {}
        }
        Ok(())
    }

    /// List every violated structural invariant. Empty means consistent.
    pub fn check_invariants(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for room in self.rooms.values() {
            for (direction, target) in &room.connections {
                if !self.rooms.contains_key(target) {
                    violations.push(format!(
                        "room {} connects {direction} to missing room {target}",
                        room.id
                    ));
                }
            }
            for item in &room.items {
                if self.items.get(item).map(|i| &i.location) != Some(&ItemLocation::Room(room.id.clone())) {
                    violations.push(format!("room {} lists item {item} located elsewhere", room.id));
                }
            }
            for npc in &room.npcs {
                if self.npcs.get(npc).map(|n| &n.location) != Some(&room.id) {
                    violations.push(format!("room {} lists npc {npc} standing elsewhere", room.id));
                }
            }
        }

        for item in self.items.values() {
            let held = match &item.location {
                ItemLocation::Room(room) => self.rooms.get(room).map(|r| r.items.contains(&item.id)),
                ItemLocation::Player(player) => self.players.get(player).map(|p| p.has_item(&item.id)),
                ItemLocation::Npc(npc) => self.npcs.get(npc).map(|n| n.inventory.contains(&item.id)),
                ItemLocation::Assembled | ItemLocation::Unplaced => Some(true),
            };
            match held {
                None => violations.push(format!("item {} located in missing {}", item.id, item.location)),
                Some(false) => violations.push(format!(
                    "item {} claims {} but is not listed there",
                    item.id, item.location
                )),
                Some(true) => {}
            }
        }

        for player in self.players.values() {
            if !self.rooms.contains_key(&player.location) {
                violations.push(format!("player {} is in missing room {}", player.id, player.location));
            }
            for item in &player.inventory {
                if self.items.get(item).map(|i| &i.location) != Some(&ItemLocation::Player(player.id.clone())) {
                    violations.push(format!("player {} carries item {item} located elsewhere", player.id));
                }
            }
        }

        for npc in self.npcs.values() {
            if !npc.dialogue_tree.contains_key(&npc.dialogue_state) {
                violations.push(format!(
                    "npc {} is in dialogue state {} missing from its tree",
                    npc.id, npc.dialogue_state
                ));
            }
            match self.rooms.get(&npc.location) {
                Some(room) if room.npcs.contains(&npc.id) => {}
                Some(_) => violations.push(format!("npc {} is not listed by its room", npc.id)),
                None => violations.push(format!("npc {} stands in missing room {}", npc.id, npc.location)),
            }
        }

        for (index, entry) in self.event_log.iter().enumerate() {
            if entry.sequence != index as u64 {
                violations.push(format!("log entry {index} carries sequence {}", entry.sequence));
            }
        }

        if self.active == self.outcome.is_some() {
            violations.push("active flag disagrees with recorded outcome".to_string());
        }

        violations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> GameState {
        let json = r#"{
            "title": "Cellar",
            "start_room": "stairs",
            "rooms": [
                {"id": "stairs", "name": "Stairs", "connections": {"down": "cellar"}, "items": ["lamp"]},
                {"id": "cellar", "name": "Cellar", "connections": {"up": "stairs"}, "npcs": ["rat"]}
            ],
            "items": [{"id": "lamp", "name": "Lamp", "location": "stairs", "takeable": true}],
            "npcs": [{"id": "rat", "name": "Rat", "location": "cellar", "dialogue_state": "squeak",
                      "dialogue_tree": {"squeak": {"text": "Squeak."}}}]
        }"#;
        ScenarioConfig::from_json(json)
            .unwrap()
            .build(GameId::new("g"), "Ada")
            .unwrap()
    }

    #[test]
    fn fresh_state_is_consistent() {
        let s = state();
        assert!(s.active);
        assert_eq!(s.current_turn, 0);
        assert!(s.check_invariants().is_empty(), "{:?}", s.check_invariants());
        assert_eq!(s.primary_player().unwrap().location, RoomId::new("stairs"));
    }

    #[test]
    fn record_numbers_entries() {
        let mut s = state();
        let actor = PlayerId::new("player_1");
        let now = Utc::now();
        s.record(actor.clone(), ActionKind::StartGame, "one", Delta::new(), now);
        s.current_turn = 1;
        let entry = s.record(actor, ActionKind::Move, "two", Delta::new(), now);
        assert_eq!(entry.sequence, 1);
        assert_eq!(entry.turn, 1);
        assert!(s.check_invariants().is_empty());
    }

    #[test]
    fn detects_split_item() {
        let mut s = state();
        s.players
            .get_mut(&PlayerId::new("player_1"))
            .unwrap()
            .add_item(ItemId::new("lamp"));
        let violations = s.check_invariants();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].contains("carries item lamp"));
    }

    #[test]
    fn detects_outcome_mismatch() {
        let mut s = state();
        s.active = false;
        assert_eq!(
            s.check_invariants(),
            vec!["active flag disagrees with recorded outcome".to_string()]
        );
    }

    #[test]
    fn outcome_labels() {
        let won = Outcome::Won {
            condition: "reach_room:vault".into(),
        };
        assert_eq!(won.label(), "won");
        assert_eq!(won.condition(), Some("reach_room:vault"));
        assert_eq!(won.to_string(), "won (reach_room:vault)");

        let ended = Outcome::Ended { reason: "quit".into() };
        assert_eq!(ended.condition(), None);
        let json = serde_json::to_string(&ended).unwrap();
        assert_eq!(json, r#"{"result":"ended","reason":"quit"}"#);
    }
}
