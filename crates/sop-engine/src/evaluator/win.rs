//! End-of-game detection.

use sop_core::{GameState, Outcome, PlayerId};

/// Test win conditions, then lose conditions, for the acting player.
///
/// Conditions are checked in declaration order and the first satisfied one
/// decides the outcome.
pub fn check_end(state: &GameState, actor: &PlayerId) -> Option<Outcome> {
    let player = state.player(actor)?;
    if let Some(c) = state.win_conditions.iter().find(|c| c.evaluate(state, player)) {
        return Some(Outcome::Won {
            condition: c.to_string(),
        });
    }
    state
        .lose_conditions
        .iter()
        .find(|c| c.evaluate(state, player))
        .map(|c| Outcome::Lost {
            condition: c.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sop_core::RoomId;

    const PIT: &str = r#"{
        "title": "Pit",
        "start_room": "edge",
        "global_flags": {"fell": false},
        "win_conditions": ["reach_room:far_side", {"type": "has_item", "item": "rope"}],
        "lose_conditions": ["flag:fell=true"],
        "rooms": [
            {"id": "edge", "name": "Edge", "connections": {"across": "far_side"}},
            {"id": "far_side", "name": "Far Side", "connections": {"back": "edge"}}
        ],
        "items": [{"id": "rope", "name": "Rope", "location": "edge", "takeable": true}]
    }"#;

    #[test]
    fn nothing_holds_at_start() {
        let s = crate::evaluator::tests::state(PIT);
        assert_eq!(check_end(&s, &PlayerId::new("player_1")), None);
    }

    #[test]
    fn room_condition_wins() {
        let mut s = crate::evaluator::tests::state(PIT);
        let actor = PlayerId::new("player_1");
        if let Some(p) = s.players.get_mut(&actor) {
            p.location = RoomId::new("far_side");
        }
        assert_eq!(
            check_end(&s, &actor),
            Some(Outcome::Won {
                condition: "reach_room:far_side".into()
            })
        );
    }

    #[test]
    fn win_checked_before_lose() {
        let mut s = crate::evaluator::tests::state(PIT);
        let actor = PlayerId::new("player_1");
        s.global_flags.insert("fell".into(), true.into());
        assert!(matches!(check_end(&s, &actor), Some(Outcome::Lost { .. })));
        if let Some(p) = s.players.get_mut(&actor) {
            p.location = RoomId::new("far_side");
        }
        assert!(matches!(check_end(&s, &actor), Some(Outcome::Won { .. })));
    }
}
