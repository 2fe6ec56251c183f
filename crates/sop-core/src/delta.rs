//! Structured state changes.
//!
//! Every accepted action is described by a [`Delta`]. The engine applies it
//! to a working copy of the state and records it in the log, so a log can be
//! replayed against the initial state of a game.

use serde::{Deserialize, Serialize};

use crate::entity::ItemLocation;
use crate::error::StateError;
use crate::id::{ItemId, NpcId, PlayerId, RoomId};
use crate::state::{GameState, Outcome};
use crate::value::FlagValue;

/// One atomic mutation of the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "change", rename_all = "snake_case")]
pub enum Change {
    /// A player walked from one room to another.
    PlayerMoved {
        /// Who moved.
        player: PlayerId,
        /// Room left.
        from: RoomId,
        /// Room entered.
        to: RoomId,
    },
    /// An item changed containers.
    ItemMoved {
        /// The item.
        item: ItemId,
        /// Previous container.
        from: ItemLocation,
        /// New container.
        to: ItemLocation,
    },
    /// An item left the world.
    ItemConsumed {
        /// The item.
        item: ItemId,
        /// Where it was when consumed.
        from: ItemLocation,
    },
    /// A global flag was written.
    FlagSet {
        /// Flag name.
        flag: String,
        /// Value before the write, if the flag was set.
        previous: Option<FlagValue>,
        /// Value written.
        value: FlagValue,
    },
    /// An NPC's conversation moved to another node.
    DialogueAdvanced {
        /// The NPC.
        npc: NpcId,
        /// Node before.
        from: String,
        /// Node after.
        to: String,
    },
    /// The access requirement on an exit was removed.
    ExitUnlocked {
        /// Room holding the exit.
        room: RoomId,
        /// Direction key of the exit.
        direction: String,
    },
    /// The turn counter moved forward.
    TurnAdvanced {
        /// Turn before.
        from: u64,
        /// Turn after.
        to: u64,
    },
    /// The game stopped accepting actions.
    GameEnded {
        /// How it ended.
        outcome: Outcome,
    },
}

impl Change {
    /// Apply this change, checking its recorded precondition first.
    pub fn apply(&self, state: &mut GameState) -> Result<(), StateError> {
        match self {
            Self::PlayerMoved { player, from, to } => {
                if !state.rooms.contains_key(to) {
                    return Err(StateError::RoomNotFound(to.clone()));
                }
                let p = state
                    .players
                    .get_mut(player)
                    .ok_or_else(|| StateError::PlayerNotFound(player.clone()))?;
                if &p.location != from {
                    return Err(StateError::Stale(format!(
                        "player {player} is in {}, not {from}",
                        p.location
                    )));
                }
                p.location = to.clone();
            }
            Self::ItemMoved { item, from, to } => {
                check_item_location(state, item, from)?;
                state.detach_item(item, from)?;
                state.attach_item(item, to)?;
                if let Some(i) = state.items.get_mut(item) {
                    i.location = to.clone();
                }
            }
            Self::ItemConsumed { item, from } => {
                check_item_location(state, item, from)?;
                state.detach_item(item, from)?;
                if let Some(i) = state.items.get_mut(item) {
                    i.location = ItemLocation::Unplaced;
                }
            }
            Self::FlagSet {
                flag,
                previous,
                value,
            } => {
                if state.global_flags.get(flag) != previous.as_ref() {
                    return Err(StateError::Stale(format!("flag {flag} changed underneath")));
                }
                state.global_flags.insert(flag.clone(), value.clone());
            }
            Self::DialogueAdvanced { npc, from, to } => {
                let n = state
                    .npcs
                    .get_mut(npc)
                    .ok_or_else(|| StateError::NpcNotFound(npc.clone()))?;
                if &n.dialogue_state != from {
                    return Err(StateError::Stale(format!(
                        "npc {npc} is in dialogue state {}, not {from}",
                        n.dialogue_state
                    )));
                }
                if !n.dialogue_tree.contains_key(to) {
                    return Err(StateError::Stale(format!("npc {npc} has no dialogue state {to}")));
                }
                n.dialogue_state = to.clone();
            }
            Self::ExitUnlocked { room, direction } => {
                let r = state
                    .rooms
                    .get_mut(room)
                    .ok_or_else(|| StateError::RoomNotFound(room.clone()))?;
                if r.access_requirements.remove(direction).is_none() {
                    return Err(StateError::Stale(format!(
                        "exit {direction} of {room} is not locked"
                    )));
                }
            }
            Self::TurnAdvanced { from, to } => {
                if state.current_turn != *from {
                    return Err(StateError::Stale(format!(
                        "turn is {}, not {from}",
                        state.current_turn
                    )));
                }
                state.current_turn = *to;
            }
            Self::GameEnded { outcome } => {
                state.active = false;
                state.outcome = Some(outcome.clone());
            }
        }
        Ok(())
    }
}

fn check_item_location(state: &GameState, item: &ItemId, expected: &ItemLocation) -> Result<(), StateError> {
    let current = &state
        .items
        .get(item)
        .ok_or_else(|| StateError::ItemNotFound(item.clone()))?
        .location;
    if current != expected {
        return Err(StateError::Stale(format!(
            "item {item} is in {current}, not {expected}"
        )));
    }
    Ok(())
}

/// An ordered list of changes produced by one action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Delta(Vec<Change>);

impl Delta {
    /// An empty delta.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a change.
    pub fn push(&mut self, change: Change) {
        self.0.push(change);
    }

    /// Builder-style append.
    pub fn with(mut self, change: Change) -> Self {
        self.0.push(change);
        self
    }

    /// The changes in application order.
    pub fn changes(&self) -> &[Change] {
        &self.0
    }

    /// Whether the delta carries no changes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every change in order.
    ///
    /// Fails without touching `state` further once a change is stale; callers
    /// apply deltas to a working copy and discard it on error.
    pub fn apply(&self, state: &mut GameState) -> Result<(), StateError> {
        if !state.active {
            return Err(StateError::Ended);
        }
        for change in &self.0 {
            change.apply(state)?;
        }
        Ok(())
    }
}

impl From<Vec<Change>> for Delta {
    fn from(changes: Vec<Change>) -> Self {
        Self(changes)
    }
}

impl IntoIterator for Delta {
    type Item = Change;
    type IntoIter = std::vec::IntoIter<Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Delta {
    type Item = &'a Change;
    type IntoIter = std::slice::Iter<'a, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::ScenarioConfig;
    use crate::id::GameId;

    fn state() -> GameState {
        let json = r#"{
            "title": "Tiny",
            "start_room": "hall",
            "global_flags": {"lamp_lit": false},
            "rooms": [
                {"id": "hall", "name": "Hall", "connections": {"north": "attic"}, "items": ["lamp"]},
                {"id": "attic", "name": "Attic", "connections": {"south": "hall"}}
            ],
            "items": [{"id": "lamp", "name": "Lamp", "location": "hall", "takeable": true}]
        }"#;
        ScenarioConfig::from_json(json)
            .unwrap()
            .build(GameId::new("g"), "Ada")
            .unwrap()
    }

    #[test]
    fn move_take_and_flag() {
        let mut s = state();
        let player = PlayerId::new("player_1");
        let delta = Delta::new()
            .with(Change::ItemMoved {
                item: "lamp".into(),
                from: ItemLocation::Room("hall".into()),
                to: ItemLocation::Player(player.clone()),
            })
            .with(Change::PlayerMoved {
                player: player.clone(),
                from: "hall".into(),
                to: "attic".into(),
            })
            .with(Change::FlagSet {
                flag: "lamp_lit".into(),
                previous: Some(false.into()),
                value: true.into(),
            })
            .with(Change::TurnAdvanced { from: 0, to: 1 });
        delta.apply(&mut s).unwrap();

        assert_eq!(s.players[&player].location, RoomId::new("attic"));
        assert!(s.players[&player].has_item(&"lamp".into()));
        assert!(s.rooms[&RoomId::new("hall")].items.is_empty());
        assert_eq!(s.global_flags["lamp_lit"], FlagValue::Boolean(true));
        assert_eq!(s.current_turn, 1);
        assert!(s.check_invariants().is_empty());
    }

    #[test]
    fn stale_change_is_refused() {
        let mut s = state();
        let delta = Delta::from(vec![Change::PlayerMoved {
            player: "player_1".into(),
            from: "attic".into(),
            to: "hall".into(),
        }]);
        assert!(matches!(delta.apply(&mut s), Err(StateError::Stale(_))));

        let delta = Delta::from(vec![Change::TurnAdvanced { from: 4, to: 5 }]);
        assert!(matches!(delta.apply(&mut s), Err(StateError::Stale(_))));
    }

    #[test]
    fn consume_leaves_world() {
        let mut s = state();
        Change::ItemConsumed {
            item: "lamp".into(),
            from: ItemLocation::Room("hall".into()),
        }
        .apply(&mut s)
        .unwrap();
        assert_eq!(s.items[&ItemId::new("lamp")].location, ItemLocation::Unplaced);
        assert!(s.check_invariants().is_empty());
    }

    #[test]
    fn ended_state_rejects_deltas() {
        let mut s = state();
        Delta::new()
            .with(Change::GameEnded {
                outcome: Outcome::Ended {
                    reason: "quit".into(),
                },
            })
            .apply(&mut s)
            .unwrap();
        assert!(s.is_ended());
        let again = Delta::from(vec![Change::TurnAdvanced { from: 0, to: 1 }]);
        assert!(matches!(again.apply(&mut s), Err(StateError::Ended)));
    }
}
