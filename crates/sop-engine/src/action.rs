//! Actions an external actor can issue.

use serde::{Deserialize, Serialize};
use sop_core::{ActionKind, ItemId, NpcId};

/// A discrete player action, addressed by entity id.
///
/// Name resolution from free text happens before an action is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Walk through an exit of the current room.
    Move {
        /// Exit key, matched without regard to case.
        direction: String,
    },
    /// Pick up an item lying in the current room.
    Take {
        /// Item to pick up.
        item: ItemId,
    },
    /// Put down a carried item.
    Drop {
        /// Item to put down.
        item: ItemId,
    },
    /// Use a carried item, optionally on a target.
    Use {
        /// Item to use.
        item: ItemId,
        /// Entity the item is used on; only effects aimed at it care.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        target: Option<String>,
    },
    /// Talk to an NPC in the current room.
    Talk {
        /// NPC to talk to.
        npc: NpcId,
        /// What the player says; its content is not interpreted.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Describe the current room.
    LookAround,
    /// List carried items.
    CheckInventory,
    /// List the actions whose preconditions hold right now.
    GetAvailableActions,
}

impl Action {
    /// The log kind for state-changing actions; `None` for queries.
    pub fn kind(&self) -> Option<ActionKind> {
        match self {
            Self::Move { .. } => Some(ActionKind::Move),
            Self::Take { .. } => Some(ActionKind::Take),
            Self::Drop { .. } => Some(ActionKind::Drop),
            Self::Use { .. } => Some(ActionKind::Use),
            Self::Talk { .. } => Some(ActionKind::Talk),
            Self::LookAround | Self::CheckInventory | Self::GetAvailableActions => None,
        }
    }

    /// Whether the action only reads state.
    pub fn is_query(&self) -> bool {
        self.kind().is_none()
    }
}
