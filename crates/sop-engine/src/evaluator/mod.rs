//! Pure action evaluation.
//!
//! [`evaluate`] inspects a state and an action and decides what would happen,
//! without mutating anything. An accepted action carries the [`Delta`] the
//! engine applies; a rejected one carries the reason and the player-facing
//! message.

mod access;
mod dialogue;
mod effect;
pub mod projection;
mod win;

use serde::{Deserialize, Serialize};
use sop_core::{Change, Delta, GameState, ItemLocation, Outcome, Player, PlayerId};

use crate::action::Action;
use crate::error::{GameError, GameResult};

pub use win::check_end;

/// Why an action was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The current room has no exit that way.
    NoExit,
    /// A required item is not carried.
    MissingItem,
    /// A required flag does not hold.
    MissingFlag,
    /// No item with that id exists.
    UnknownItem,
    /// The item is not in the current room.
    ItemNotHere,
    /// The item cannot be picked up.
    NotTakeable,
    /// The item is not carried.
    NotCarried,
    /// The item cannot be used.
    NotUseable,
    /// No NPC with that id exists.
    UnknownNpc,
    /// The NPC is not in the current room.
    NpcNotHere,
}

/// A refused action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rejection {
    /// Machine-readable cause.
    pub reason: RejectReason,
    /// Text shown to the player.
    pub message: String,
}

impl Rejection {
    pub(crate) fn new(reason: RejectReason, message: impl Into<String>) -> Self {
        Self {
            reason,
            message: message.into(),
        }
    }
}

/// An accepted action and everything it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Acceptance {
    /// Changes to apply; empty for queries.
    pub delta: Delta,
    /// Human-readable description of the result.
    pub message: String,
    /// Named side effects, e.g. `flag_set:sword_empowered`.
    pub triggered_events: Vec<String>,
    /// Set when an effect ends the game outright.
    pub ends_game: Option<Outcome>,
}

impl Acceptance {
    fn query(message: String) -> Self {
        Self {
            delta: Delta::new(),
            message,
            triggered_events: Vec::new(),
            ends_game: None,
        }
    }

    fn turn(state: &GameState, mut changes: Vec<Change>, message: String) -> Self {
        changes.push(Change::TurnAdvanced {
            from: state.current_turn,
            to: state.current_turn + 1,
        });
        Self {
            delta: Delta::from(changes),
            message,
            triggered_events: Vec::new(),
            ends_game: None,
        }
    }
}

/// The outcome of evaluating an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    /// The action is allowed; apply the changes.
    Accepted(Acceptance),
    /// The action is refused; nothing changes.
    Rejected(Rejection),
}

impl Verdict {
    /// Whether the action was accepted.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// The player-facing message either way.
    pub fn message(&self) -> &str {
        match self {
            Self::Accepted(a) => &a.message,
            Self::Rejected(r) => &r.message,
        }
    }
}

impl From<Rejection> for Verdict {
    fn from(rejection: Rejection) -> Self {
        Self::Rejected(rejection)
    }
}

/// Decide the effect of `action` taken by `actor`.
///
/// Returns an error only for structural problems: an ended game, an unknown
/// actor, or a state that violates its own invariants.
pub fn evaluate(state: &GameState, actor: &PlayerId, action: &Action) -> GameResult<Verdict> {
    if state.is_ended() {
        return Err(GameError::InvalidState(format!(
            "game {} has ended",
            state.game_id
        )));
    }
    let player = state
        .player(actor)
        .ok_or_else(|| GameError::PlayerNotFound(actor.clone()))?;

    let verdict = match action {
        Action::Move { direction } => do_move(state, player, direction)?,
        Action::Take { item } => do_take(state, player, item),
        Action::Drop { item } => do_drop(state, player, item),
        Action::Use { item, target } => effect::do_use(state, player, item, target.as_deref()),
        Action::Talk { npc, .. } => dialogue::do_talk(state, player, npc)?,
        Action::LookAround => Verdict::Accepted(Acceptance::query(projection::look_around(state, actor)?)),
        Action::CheckInventory => {
            let text = projection::render_inventory(&projection::inventory(state, actor)?);
            Verdict::Accepted(Acceptance::query(text))
        }
        Action::GetAvailableActions => {
            let text = projection::render_actions(&projection::available_actions(state, actor)?);
            Verdict::Accepted(Acceptance::query(text))
        }
    };
    Ok(verdict)
}

fn do_move(state: &GameState, player: &Player, direction: &str) -> GameResult<Verdict> {
    let room = state
        .room(&player.location)
        .ok_or_else(|| GameError::InvalidState(format!("player stands in missing room {}", player.location)))?;

    let Some((key, target_id)) = room.exit(direction) else {
        return Ok(Rejection::new(
            RejectReason::NoExit,
            format!("You cannot go {direction} from here."),
        )
        .into());
    };
    let target = state
        .room(target_id)
        .ok_or_else(|| GameError::InvalidState(format!("exit {key} leads to missing room {target_id}")))?;

    let gates = room
        .access_requirements
        .get(key)
        .into_iter()
        .chain(target.entry_requirements.as_ref());
    for gate in gates {
        if let Err(rejection) = access::check(state, player, gate) {
            return Ok(rejection.into());
        }
    }

    let changes = vec![Change::PlayerMoved {
        player: player.id.clone(),
        from: room.id.clone(),
        to: target.id.clone(),
    }];
    let message = format!("You go {key} to {}.\n{}", target.name, target.description);
    Ok(Verdict::Accepted(Acceptance::turn(state, changes, message)))
}

fn do_take(state: &GameState, player: &Player, item_id: &sop_core::ItemId) -> Verdict {
    let Some(item) = state.item(item_id) else {
        return Rejection::new(RejectReason::UnknownItem, format!("There is no {item_id} here.")).into();
    };
    let here = ItemLocation::Room(player.location.clone());
    if item.location != here {
        return Rejection::new(RejectReason::ItemNotHere, format!("There is no {} here.", item.name)).into();
    }
    if !item.takeable {
        return Rejection::new(RejectReason::NotTakeable, format!("You cannot take the {}.", item.name)).into();
    }
    let changes = vec![Change::ItemMoved {
        item: item.id.clone(),
        from: here,
        to: ItemLocation::Player(player.id.clone()),
    }];
    Verdict::Accepted(Acceptance::turn(state, changes, format!("You take the {}.", item.name)))
}

fn do_drop(state: &GameState, player: &Player, item_id: &sop_core::ItemId) -> Verdict {
    let carried = ItemLocation::Player(player.id.clone());
    let Some(item) = state.item(item_id).filter(|i| i.location == carried) else {
        return Rejection::new(RejectReason::NotCarried, format!("You don't have a {item_id}.")).into();
    };
    let changes = vec![Change::ItemMoved {
        item: item.id.clone(),
        from: carried,
        to: ItemLocation::Room(player.location.clone()),
    }];
    Verdict::Accepted(Acceptance::turn(state, changes, format!("You drop the {}.", item.name)))
}
