//! Read-only views of the state for one player.
//!
//! Nothing here mutates state, advances the turn, or writes to the log.

use serde::{Deserialize, Serialize};
use sop_core::{GameState, ItemId, Player, PlayerId, Room};

use super::{Verdict, evaluate};
use crate::action::Action;
use crate::error::{GameError, GameResult};

/// One carried item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    /// Item id.
    pub id: ItemId,
    /// Display name.
    pub name: String,
    /// Item description.
    pub description: String,
    /// Whether the item can be used.
    pub useable: bool,
}

/// An action that would be accepted right now, with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableAction {
    /// The action itself.
    pub action: Action,
    /// Short text for menus.
    pub label: String,
}

fn locate<'a>(state: &'a GameState, actor: &PlayerId) -> GameResult<(&'a Player, &'a Room)> {
    let player = state
        .player(actor)
        .ok_or_else(|| GameError::PlayerNotFound(actor.clone()))?;
    let room = state
        .room(&player.location)
        .ok_or_else(|| GameError::InvalidState(format!("player stands in missing room {}", player.location)))?;
    Ok((player, room))
}

/// Describe the player's room: name, prose, items, people, exits.
pub fn look_around(state: &GameState, actor: &PlayerId) -> GameResult<String> {
    let (_, room) = locate(state, actor)?;
    let mut out = format!("**{}**\n{}\n", room.name, room.description);

    let items: Vec<&str> = room
        .items
        .iter()
        .filter_map(|id| state.item(id))
        .map(|i| i.name.as_str())
        .collect();
    if !items.is_empty() {
        out.push_str(&format!("\nItems here: {}", items.join(", ")));
    }

    let npcs: Vec<&str> = room
        .npcs
        .iter()
        .filter_map(|id| state.npc(id))
        .map(|n| n.name.as_str())
        .collect();
    if !npcs.is_empty() {
        out.push_str(&format!("\nPeople here: {}", npcs.join(", ")));
    }

    if !room.connections.is_empty() {
        let exits: Vec<&str> = room.connections.keys().map(String::as_str).collect();
        out.push_str(&format!("\nExits: {}", exits.join(", ")));
    }
    Ok(out)
}

/// Carried items in pickup order.
pub fn inventory(state: &GameState, actor: &PlayerId) -> GameResult<Vec<InventoryEntry>> {
    let (player, _) = locate(state, actor)?;
    Ok(player
        .inventory
        .iter()
        .filter_map(|id| state.item(id))
        .map(|i| InventoryEntry {
            id: i.id.clone(),
            name: i.name.clone(),
            description: i.description.clone(),
            useable: i.useable,
        })
        .collect())
}

/// Render an inventory listing.
pub fn render_inventory(entries: &[InventoryEntry]) -> String {
    if entries.is_empty() {
        return "Your inventory is empty.".to_string();
    }
    let lines: Vec<String> = entries
        .iter()
        .map(|e| {
            let mut line = format!("- {}: {}", e.name, e.description);
            if e.useable {
                line.push_str(" (useable)");
            }
            line
        })
        .collect();
    format!("Your inventory contains:\n{}", lines.join("\n"))
}

/// Every action whose preconditions hold now.
///
/// Each candidate is run through the evaluator, so a gated exit or an item
/// whose use requirements fail is left out.
pub fn available_actions(state: &GameState, actor: &PlayerId) -> GameResult<Vec<AvailableAction>> {
    let (player, room) = locate(state, actor)?;

    let mut candidates = vec![(Action::LookAround, "look around".to_string())];
    for direction in room.connections.keys() {
        candidates.push((
            Action::Move {
                direction: direction.clone(),
            },
            format!("go {direction}"),
        ));
    }
    for item in room.items.iter().filter_map(|id| state.item(id)) {
        candidates.push((Action::Take { item: item.id.clone() }, format!("take {}", item.name)));
    }
    for item in player.inventory.iter().filter_map(|id| state.item(id)) {
        candidates.push((Action::Drop { item: item.id.clone() }, format!("drop {}", item.name)));
        candidates.push((
            Action::Use {
                item: item.id.clone(),
                target: None,
            },
            format!("use {}", item.name),
        ));
    }
    for npc in room.npcs.iter().filter_map(|id| state.npc(id)) {
        candidates.push((
            Action::Talk {
                npc: npc.id.clone(),
                message: None,
            },
            format!("talk to {}", npc.name),
        ));
    }
    candidates.push((Action::CheckInventory, "check inventory".to_string()));

    let mut available = Vec::new();
    for (action, label) in candidates {
        if let Verdict::Accepted(_) = evaluate(state, actor, &action)? {
            available.push(AvailableAction { action, label });
        }
    }
    Ok(available)
}

/// Render an action listing.
pub fn render_actions(actions: &[AvailableAction]) -> String {
    if actions.is_empty() {
        return "No actions available.".to_string();
    }
    let lines: Vec<String> = actions.iter().map(|a| format!("- {}", a.label)).collect();
    format!("Available actions:\n{}", lines.join("\n"))
}
