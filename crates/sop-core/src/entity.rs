use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::{ItemId, NpcId, PlayerId, RoomId};
use crate::rule::{AccessRequirement, Requirement, UseEffect};
use crate::value::Flags;

/// A node in the room graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room id.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Prose shown on look.
    pub description: String,
    /// Direction to target room, at most one target per direction.
    pub connections: BTreeMap<String, RoomId>,
    /// Items lying in the room.
    pub items: BTreeSet<ItemId>,
    /// NPCs standing in the room.
    pub npcs: BTreeSet<NpcId>,
    /// Mutable per-room state.
    pub state_flags: Flags,
    /// Gates on individual exits, keyed by direction.
    pub access_requirements: BTreeMap<String, AccessRequirement>,
    /// Gate on every entrance into this room.
    pub entry_requirements: Option<AccessRequirement>,
}

impl Room {
    /// Find the connection for a direction, ignoring case.
    ///
    /// Returns the direction key as stored along with the target.
    pub fn exit(&self, direction: &str) -> Option<(&str, &RoomId)> {
        self.connections
            .iter()
            .find(|(dir, _)| dir.eq_ignore_ascii_case(direction))
            .map(|(dir, target)| (dir.as_str(), target))
    }
}

/// Where an item currently lives. Exactly one container owns an item.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemLocation {
    /// Lying in a room.
    Room(RoomId),
    /// Carried by a player.
    Player(PlayerId),
    /// Carried by an NPC.
    Npc(NpcId),
    /// Combined into something else.
    Assembled,
    /// Not anywhere in the world (consumed or not yet placed).
    Unplaced,
}

impl fmt::Display for ItemLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Room(id) => write!(f, "room {id}"),
            Self::Player(id) => write!(f, "player {id}"),
            Self::Npc(id) => write!(f, "npc {id}"),
            Self::Assembled => write!(f, "assembled"),
            Self::Unplaced => write!(f, "unplaced"),
        }
    }
}

/// An object in the world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Unique item id.
    pub id: ItemId,
    /// Display name, also used for name resolution.
    pub name: String,
    /// Prose shown in inventory listings.
    pub description: String,
    /// Owning container.
    pub location: ItemLocation,
    /// Whether the item can be picked up.
    pub takeable: bool,
    /// Whether the item can be used.
    pub useable: bool,
    /// Free-form properties.
    pub properties: Flags,
    /// Preconditions for using the item.
    pub use_requirements: Vec<Requirement>,
    /// Mutations applied on use.
    pub use_effects: Vec<UseEffect>,
}

/// One state of an NPC's conversation automaton.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueNode {
    /// Line spoken while in this state.
    pub text: String,
    /// State entered after speaking; `None` stays put.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_state: Option<String>,
}

/// A non-player character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    /// Unique NPC id.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Prose description.
    pub description: String,
    /// Room the NPC stands in.
    pub location: RoomId,
    /// Current dialogue state key.
    pub dialogue_state: String,
    /// Dialogue automaton.
    pub dialogue_tree: BTreeMap<String, DialogueNode>,
    /// Items carried by the NPC.
    pub inventory: Vec<ItemId>,
}

impl Npc {
    /// The node for the current dialogue state.
    pub fn current_node(&self) -> Option<&DialogueNode> {
        self.dialogue_tree.get(&self.dialogue_state)
    }
}

/// A player character driven by an external actor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player id.
    pub id: PlayerId,
    /// Display name.
    pub name: String,
    /// Current room.
    pub location: RoomId,
    /// Carried items in pickup order.
    pub inventory: Vec<ItemId>,
    /// Free-form stats.
    pub stats: Flags,
}

impl Player {
    /// Create a player at the given room with an empty inventory.
    pub fn new(id: PlayerId, name: impl Into<String>, location: RoomId) -> Self {
        Self {
            id,
            name: name.into(),
            location,
            inventory: Vec::new(),
            stats: Flags::new(),
        }
    }

    /// Check if the player has an item.
    pub fn has_item(&self, item: &ItemId) -> bool {
        self.inventory.contains(item)
    }

    /// Add an item to inventory.
    pub fn add_item(&mut self, item: ItemId) {
        if !self.inventory.contains(&item) {
            self.inventory.push(item);
        }
    }

    /// Remove an item from inventory.
    pub fn remove_item(&mut self, item: &ItemId) -> bool {
        if let Some(pos) = self.inventory.iter().position(|id| id == item) {
            self.inventory.remove(pos);
            true
        } else {
            false
        }
    }
}
