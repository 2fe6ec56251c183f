//! Scenario configuration: loading, validation, and seeding a new game.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::condition::Condition;
use crate::entity::{DialogueNode, Item, ItemLocation, Npc, Player, Room};
use crate::error::{SchemaError, SchemaResult};
use crate::id::{GameId, ItemId, NpcId, PlayerId, RoomId, DEFAULT_PLAYER_ID};
use crate::rule::{AccessRequirement, Requirement, UseEffect};
use crate::state::GameState;
use crate::value::Flags;

/// A room as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Unique room id.
    pub id: RoomId,
    /// Display name.
    pub name: String,
    /// Text shown when the room is described.
    #[serde(default)]
    pub description: String,
    /// Exits: direction key to target room.
    #[serde(default)]
    pub connections: BTreeMap<String, RoomId>,
    /// Items lying here at the start; each must name this room as its location.
    #[serde(default)]
    pub items: Vec<ItemId>,
    /// NPCs standing here at the start.
    #[serde(default)]
    pub npcs: Vec<NpcId>,
    /// Room-local flags.
    #[serde(default)]
    pub state_flags: Flags,
    /// Requirements for leaving through an exit, keyed by direction.
    #[serde(default)]
    pub access_requirements: BTreeMap<String, AccessRequirement>,
    /// Requirements for entering this room from anywhere.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_requirements: Option<AccessRequirement>,
}

/// An item as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Unique item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Text shown in the inventory.
    #[serde(default)]
    pub description: String,
    /// Room id, NPC id, player id, `assembled` or `unplaced`.
    #[serde(default = "unplaced")]
    pub location: String,
    /// Whether players can pick it up.
    #[serde(default)]
    pub takeable: bool,
    /// Whether players can use it.
    #[serde(default)]
    pub useable: bool,
    /// Free-form item properties.
    #[serde(default)]
    pub properties: Flags,
    /// Requirements checked before the item can be used.
    #[serde(default)]
    pub use_requirements: Vec<Requirement>,
    /// Effects applied, in order, when the item is used.
    #[serde(default)]
    pub use_effects: Vec<UseEffect>,
}

fn unplaced() -> String {
    "unplaced".to_string()
}

/// An NPC as written in a scenario file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NpcConfig {
    /// Unique NPC id.
    pub id: NpcId,
    /// Display name.
    pub name: String,
    /// Text shown when the NPC is described.
    #[serde(default)]
    pub description: String,
    /// Room the NPC stands in.
    pub location: RoomId,
    /// Dialogue node the conversation starts at.
    pub dialogue_state: String,
    /// Dialogue nodes keyed by state.
    pub dialogue_tree: BTreeMap<String, DialogueNode>,
    /// Items the NPC carries at the start.
    #[serde(default)]
    pub inventory: Vec<ItemId>,
}

/// A complete scenario: the initial world of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Scenario title.
    pub title: String,
    /// Introductory text.
    #[serde(default)]
    pub description: String,
    /// Room every player starts in.
    pub start_room: RoomId,
    /// Every flag rules may refer to, with its initial value.
    #[serde(default)]
    pub global_flags: Flags,
    /// Conditions that win the game, checked in order.
    #[serde(default)]
    pub win_conditions: Vec<Condition>,
    /// Conditions that lose the game, checked after the win conditions.
    #[serde(default)]
    pub lose_conditions: Vec<Condition>,
    /// All rooms; at least one.
    pub rooms: Vec<RoomConfig>,
    /// All items.
    #[serde(default)]
    pub items: Vec<ItemConfig>,
    /// All NPCs.
    #[serde(default)]
    pub npcs: Vec<NpcConfig>,
}

impl ScenarioConfig {
    /// Parse a scenario from JSON text.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a scenario file.
    pub fn from_path(path: impl AsRef<Path>) -> SchemaResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Check every cross-reference without building a state.
    pub fn validate(&self) -> SchemaResult<()> {
        Validator::new(self)?.run()
    }

    /// Validate and seed the initial state of a game.
    ///
    /// The single player is created at the start room with id `player_1`.
    pub fn build(&self, game_id: GameId, player_name: &str) -> SchemaResult<GameState> {
        self.validate()?;

        let player_id = PlayerId::new(DEFAULT_PLAYER_ID);
        let mut rooms: BTreeMap<RoomId, Room> = self
            .rooms
            .iter()
            .map(|r| {
                let room = Room {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    description: r.description.clone(),
                    connections: r.connections.clone(),
                    items: BTreeSet::new(),
                    npcs: BTreeSet::new(),
                    state_flags: r.state_flags.clone(),
                    access_requirements: r.access_requirements.clone(),
                    entry_requirements: r.entry_requirements.clone(),
                };
                (r.id.clone(), room)
            })
            .collect();

        let mut npcs: BTreeMap<NpcId, Npc> = BTreeMap::new();
        for n in &self.npcs {
            if let Some(room) = rooms.get_mut(&n.location) {
                room.npcs.insert(n.id.clone());
            }
            npcs.insert(
                n.id.clone(),
                Npc {
                    id: n.id.clone(),
                    name: n.name.clone(),
                    description: n.description.clone(),
                    location: n.location.clone(),
                    dialogue_state: n.dialogue_state.clone(),
                    dialogue_tree: n.dialogue_tree.clone(),
                    inventory: Vec::new(),
                },
            );
        }

        let mut player = Player::new(player_id.clone(), player_name, self.start_room.clone());
        let mut items = BTreeMap::new();
        for i in &self.items {
            let location = resolve_location(self, &i.location, &player_id).ok_or_else(|| {
                SchemaError::DanglingItemLocation {
                    item: i.id.clone(),
                    location: i.location.clone(),
                }
            })?;
            match &location {
                ItemLocation::Room(room) => {
                    if let Some(room) = rooms.get_mut(room) {
                        room.items.insert(i.id.clone());
                    }
                }
                ItemLocation::Npc(npc) => {
                    if let Some(npc) = npcs.get_mut(npc) {
                        npc.inventory.push(i.id.clone());
                    }
                }
                ItemLocation::Player(_) => player.add_item(i.id.clone()),
                ItemLocation::Assembled | ItemLocation::Unplaced => {}
            }
            items.insert(
                i.id.clone(),
                Item {
                    id: i.id.clone(),
                    name: i.name.clone(),
                    description: i.description.clone(),
                    location,
                    takeable: i.takeable,
                    useable: i.useable,
                    properties: i.properties.clone(),
                    use_requirements: i.use_requirements.clone(),
                    use_effects: i.use_effects.clone(),
                },
            );
        }

        let now = Utc::now();
        Ok(GameState {
            game_id,
            title: self.title.clone(),
            description: self.description.clone(),
            current_turn: 0,
            active: true,
            start_room: self.start_room.clone(),
            players: BTreeMap::from([(player_id, player)]),
            rooms,
            items,
            npcs,
            global_flags: self.global_flags.clone(),
            win_conditions: self.win_conditions.clone(),
            lose_conditions: self.lose_conditions.clone(),
            event_log: Vec::new(),
            created_at: now,
            last_action_at: now,
            outcome: None,
            summary: None,
            scenario: self.clone(),
        })
    }
}

fn resolve_location(config: &ScenarioConfig, raw: &str, player: &PlayerId) -> Option<ItemLocation> {
    match raw {
        "assembled" => return Some(ItemLocation::Assembled),
        "unplaced" => return Some(ItemLocation::Unplaced),
        _ => {}
    }
    if config.rooms.iter().any(|r| r.id.as_str() == raw) {
        Some(ItemLocation::Room(RoomId::new(raw)))
    } else if config.npcs.iter().any(|n| n.id.as_str() == raw) {
        Some(ItemLocation::Npc(NpcId::new(raw)))
    } else if player.as_str() == raw {
        Some(ItemLocation::Player(player.clone()))
    } else {
        None
    }
}

struct Validator<'a> {
    config: &'a ScenarioConfig,
    rooms: HashSet<&'a RoomId>,
    items: HashSet<&'a ItemId>,
}

impl<'a> Validator<'a> {
    fn new(config: &'a ScenarioConfig) -> SchemaResult<Self> {
        if config.rooms.is_empty() {
            return Err(SchemaError::NoRooms);
        }
        let rooms = unique("room", config.rooms.iter().map(|r| &r.id))?;
        let items = unique("item", config.items.iter().map(|i| &i.id))?;
        unique("npc", config.npcs.iter().map(|n| &n.id))?;
        Ok(Self {
            config,
            rooms,
            items,
        })
    }

    fn run(&self) -> SchemaResult<()> {
        if !self.rooms.contains(&self.config.start_room) {
            return Err(SchemaError::UnknownStartRoom(self.config.start_room.clone()));
        }
        for room in &self.config.rooms {
            self.check_room(room)?;
        }
        for item in &self.config.items {
            self.check_item(item)?;
        }
        for npc in &self.config.npcs {
            self.check_npc(npc)?;
        }
        for (label, conditions) in [
            ("win condition", &self.config.win_conditions),
            ("lose condition", &self.config.lose_conditions),
        ] {
            for condition in conditions {
                self.check_condition(label, condition)?;
            }
        }
        Ok(())
    }

    fn check_room(&self, room: &RoomConfig) -> SchemaResult<()> {
        // Exits match case-insensitively, so "North" would shadow "north".
        let mut directions = HashSet::new();
        for direction in room.connections.keys() {
            if !directions.insert(direction.to_lowercase()) {
                return Err(SchemaError::DuplicateExit {
                    room: room.id.clone(),
                    direction: direction.clone(),
                });
            }
        }
        for (direction, target) in &room.connections {
            if !self.rooms.contains(target) {
                return Err(SchemaError::DanglingConnection {
                    room: room.id.clone(),
                    direction: direction.clone(),
                    target: target.clone(),
                });
            }
        }
        for (direction, requirement) in &room.access_requirements {
            if !room.connections.contains_key(direction) {
                return Err(SchemaError::RequirementOnMissingExit {
                    room: room.id.clone(),
                    direction: direction.clone(),
                });
            }
            let context = format!("exit {direction} of room \"{}\"", room.id);
            self.check_requirements(&context, &requirement.requires)?;
        }
        if let Some(entry) = &room.entry_requirements {
            let context = format!("entry to room \"{}\"", room.id);
            self.check_requirements(&context, &entry.requires)?;
        }
        for item in &room.items {
            let located_here = self
                .config
                .items
                .iter()
                .any(|i| &i.id == item && i.location == room.id.as_str());
            if !located_here {
                if !self.items.contains(item) {
                    return Err(SchemaError::UnknownItem {
                        context: format!("room \"{}\"", room.id),
                        item: item.clone(),
                    });
                }
                return Err(SchemaError::ItemLocationMismatch {
                    room: room.id.clone(),
                    item: item.clone(),
                });
            }
        }
        for npc in &room.npcs {
            let here = self
                .config
                .npcs
                .iter()
                .any(|n| &n.id == npc && n.location == room.id);
            if !here {
                return Err(SchemaError::NpcLocationMismatch {
                    room: room.id.clone(),
                    npc: npc.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_item(&self, item: &ItemConfig) -> SchemaResult<()> {
        if resolve_location(self.config, &item.location, &PlayerId::new(DEFAULT_PLAYER_ID)).is_none() {
            return Err(SchemaError::DanglingItemLocation {
                item: item.id.clone(),
                location: item.location.clone(),
            });
        }
        let context = format!("item \"{}\"", item.id);
        self.check_requirements(&context, &item.use_requirements)?;
        self.check_effects(&item.id, &item.use_effects)
    }

    fn check_effects(&self, item: &ItemId, effects: &[UseEffect]) -> SchemaResult<()> {
        for effect in effects {
            match effect {
                UseEffect::SetFlag { flag, .. } => {
                    self.check_flag(&format!("effect of item \"{item}\""), flag)?;
                }
                UseEffect::UnlockExit { room, direction } => {
                    let Some(config) = self.config.rooms.iter().find(|r| &r.id == room) else {
                        return Err(SchemaError::UnknownRoom {
                            context: format!("effect of item \"{item}\""),
                            room: room.clone(),
                        });
                    };
                    if !config.connections.contains_key(direction) {
                        return Err(SchemaError::UnknownExit {
                            item: item.clone(),
                            room: room.clone(),
                            direction: direction.clone(),
                        });
                    }
                }
                UseEffect::OnTarget { effects, .. } => self.check_effects(item, effects)?,
                UseEffect::Consume | UseEffect::WinGame { .. } => {}
            }
        }
        Ok(())
    }

    fn check_npc(&self, npc: &NpcConfig) -> SchemaResult<()> {
        if !self.rooms.contains(&npc.location) {
            return Err(SchemaError::NpcInUnknownRoom {
                npc: npc.id.clone(),
                room: npc.location.clone(),
            });
        }
        if npc.dialogue_tree.is_empty() {
            return Err(SchemaError::EmptyDialogueTree(npc.id.clone()));
        }
        let states = std::iter::once(&npc.dialogue_state)
            .chain(npc.dialogue_tree.values().filter_map(|n| n.next_state.as_ref()));
        for state in states {
            if !npc.dialogue_tree.contains_key(state) {
                return Err(SchemaError::UnknownDialogueState {
                    npc: npc.id.clone(),
                    state: state.clone(),
                });
            }
        }
        for item in &npc.inventory {
            let carried = self
                .config
                .items
                .iter()
                .any(|i| &i.id == item && i.location == npc.id.as_str());
            if !carried {
                return Err(SchemaError::NpcInventoryMismatch {
                    npc: npc.id.clone(),
                    item: item.clone(),
                });
            }
        }
        Ok(())
    }

    fn check_requirements(&self, context: &str, requires: &[Requirement]) -> SchemaResult<()> {
        for requirement in requires {
            match requirement {
                Requirement::RequireItems { items } => {
                    for item in items {
                        self.check_item_ref(context, item)?;
                    }
                }
                Requirement::RequireFlags { flags } => {
                    for flag in flags.keys() {
                        self.check_flag(context, flag)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn check_condition(&self, context: &str, condition: &Condition) -> SchemaResult<()> {
        match condition {
            Condition::FlagEquals { flag, .. } => self.check_flag(context, flag),
            Condition::HasItem { item } => self.check_item_ref(context, item),
            Condition::InRoom { room } => {
                if self.rooms.contains(room) {
                    Ok(())
                } else {
                    Err(SchemaError::UnknownRoom {
                        context: context.to_string(),
                        room: room.clone(),
                    })
                }
            }
        }
    }

    fn check_item_ref(&self, context: &str, item: &ItemId) -> SchemaResult<()> {
        if self.items.contains(item) {
            Ok(())
        } else {
            Err(SchemaError::UnknownItem {
                context: context.to_string(),
                item: item.clone(),
            })
        }
    }

    fn check_flag(&self, context: &str, flag: &str) -> SchemaResult<()> {
        if self.config.global_flags.contains_key(flag) {
            Ok(())
        } else {
            Err(SchemaError::UndeclaredFlag {
                context: context.to_string(),
                flag: flag.to_string(),
            })
        }
    }
}

fn unique<'a, T>(kind: &'static str, ids: impl Iterator<Item = &'a T>) -> SchemaResult<HashSet<&'a T>>
where
    T: std::hash::Hash + Eq + AsRef<str> + 'a,
{
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(SchemaError::DuplicateId {
                kind,
                id: id.as_ref().to_string(),
            });
        }
    }
    Ok(seen)
}
