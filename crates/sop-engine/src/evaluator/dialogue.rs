//! Talking to NPCs.

use sop_core::{Change, GameState, NpcId, Player};

use super::{Acceptance, RejectReason, Rejection, Verdict};
use crate::error::{GameError, GameResult};

/// Speak the current node and step the NPC's dialogue automaton.
///
/// A node without `next_state` stays where it is.
pub(super) fn do_talk(state: &GameState, player: &Player, npc_id: &NpcId) -> GameResult<Verdict> {
    let Some(npc) = state.npc(npc_id) else {
        return Ok(Rejection::new(RejectReason::UnknownNpc, format!("There is no {npc_id} here.")).into());
    };
    if npc.location != player.location {
        return Ok(Rejection::new(RejectReason::NpcNotHere, format!("There is no {} here.", npc.name)).into());
    }
    let node = npc.current_node().ok_or_else(|| {
        GameError::InvalidState(format!(
            "npc {} is in unknown dialogue state {}",
            npc.id, npc.dialogue_state
        ))
    })?;

    let mut changes = Vec::new();
    let mut events = Vec::new();
    if let Some(next) = node.next_state.as_ref().filter(|next| **next != npc.dialogue_state) {
        changes.push(Change::DialogueAdvanced {
            npc: npc.id.clone(),
            from: npc.dialogue_state.clone(),
            to: next.clone(),
        });
        events.push(format!("dialogue:{}:{next}", npc.id));
    }

    let mut acceptance = Acceptance::turn(state, changes, format!("{}: {}", npc.name, node.text));
    acceptance.triggered_events = events;
    Ok(Verdict::Accepted(acceptance))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::Action;
    use crate::evaluator::evaluate;
    use sop_core::PlayerId;

    const HUT: &str = r#"{
        "title": "Hut",
        "start_room": "hut",
        "rooms": [
            {"id": "hut", "name": "Hut", "connections": {"out": "field"}, "npcs": ["hermit"]},
            {"id": "field", "name": "Field", "connections": {"in": "hut"}, "npcs": ["crow"]}
        ],
        "npcs": [
            {"id": "hermit", "name": "Hermit", "location": "hut", "dialogue_state": "wary",
             "dialogue_tree": {"wary": {"text": "Who goes there?", "next_state": "calm"},
                               "calm": {"text": "Sit, rest."}}},
            {"id": "crow", "name": "Crow", "location": "field", "dialogue_state": "caw",
             "dialogue_tree": {"caw": {"text": "Caw.", "next_state": "caw"}}}
        ]
    }"#;

    fn talk(state: &GameState, npc: &str) -> Verdict {
        let action = Action::Talk {
            npc: npc.into(),
            message: Some("hello".into()),
        };
        evaluate(state, &PlayerId::new("player_1"), &action).unwrap()
    }

    #[test]
    fn advances_then_loops() {
        let mut s = crate::evaluator::tests::state(HUT);
        let Verdict::Accepted(a) = talk(&s, "hermit") else {
            panic!("expected acceptance");
        };
        assert_eq!(a.message, "Hermit: Who goes there?");
        a.delta.apply(&mut s).unwrap();
        assert_eq!(s.npcs[&NpcId::new("hermit")].dialogue_state, "calm");

        let Verdict::Accepted(a) = talk(&s, "hermit") else {
            panic!("expected acceptance");
        };
        assert_eq!(a.message, "Hermit: Sit, rest.");
        assert_eq!(a.delta.changes().len(), 1);
    }

    #[test]
    fn npc_elsewhere() {
        let s = crate::evaluator::tests::state(HUT);
        let Verdict::Rejected(r) = talk(&s, "crow") else {
            panic!("expected rejection");
        };
        assert_eq!(r.reason, RejectReason::NpcNotHere);
        assert_eq!(r.message, "There is no Crow here.");
    }
}
