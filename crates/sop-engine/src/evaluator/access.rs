//! Access requirement checks.

use sop_core::{AccessRequirement, GameState, Player, Requirement};

use super::{RejectReason, Rejection};

/// Shown when a gate has no text of its own. Names neither item nor flag.
const CLOSED: &str = "You cannot access that area yet.";

/// Check a gate for the acting player.
pub(super) fn check(state: &GameState, player: &Player, gate: &AccessRequirement) -> Result<(), Rejection> {
    match first_unmet(state, player, &gate.requires) {
        None => Ok(()),
        Some(reason) => Err(Rejection::new(
            reason,
            gate.message.as_deref().unwrap_or(CLOSED),
        )),
    }
}

/// The reason the first unmet requirement fails, if any.
pub(super) fn first_unmet(state: &GameState, player: &Player, requires: &[Requirement]) -> Option<RejectReason> {
    requires.iter().find_map(|requirement| match requirement {
        Requirement::RequireItems { items } => items
            .iter()
            .any(|item| !player.has_item(item))
            .then_some(RejectReason::MissingItem),
        Requirement::RequireFlags { flags } => flags
            .iter()
            .any(|(flag, value)| state.global_flags.get(flag) != Some(value))
            .then_some(RejectReason::MissingFlag),
    })
}
