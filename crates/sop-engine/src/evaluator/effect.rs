//! Item use and its side effects.

use std::collections::BTreeMap;

use sop_core::{Change, FlagValue, GameState, Item, ItemId, ItemLocation, Outcome, Player, UseEffect};

use super::{Acceptance, RejectReason, Rejection, Verdict, access};

pub(super) fn do_use(state: &GameState, player: &Player, item_id: &ItemId, target: Option<&str>) -> Verdict {
    let carried = ItemLocation::Player(player.id.clone());
    let Some(item) = state.item(item_id).filter(|i| i.location == carried) else {
        return Rejection::new(RejectReason::NotCarried, format!("You don't have a {item_id}.")).into();
    };
    if !item.useable {
        return Rejection::new(RejectReason::NotUseable, format!("You cannot use the {}.", item.name)).into();
    }
    if let Some(reason) = access::first_unmet(state, player, &item.use_requirements) {
        return Rejection::new(reason, format!("Nothing happens when you use the {}.", item.name)).into();
    }

    let mut effects = Vec::new();
    flatten(&item.use_effects, target, &mut effects);
    let plan = plan(state, player, item, &effects);

    let mut message = match target {
        Some(target) => format!("You use the {} on {target}.", item.name),
        None => format!("You use the {}.", item.name),
    };
    for line in &plan.lines {
        message.push(' ');
        message.push_str(line);
    }

    let mut acceptance = Acceptance::turn(state, plan.changes, message);
    acceptance.triggered_events = plan.events;
    acceptance.ends_game = plan.win;
    Verdict::Accepted(acceptance)
}

/// Expand `OnTarget` wrappers whose target matches, in declaration order.
fn flatten<'a>(effects: &'a [UseEffect], target: Option<&str>, out: &mut Vec<&'a UseEffect>) {
    for effect in effects {
        match effect {
            UseEffect::OnTarget { target: wanted, effects } => {
                if target.is_some_and(|t| t.eq_ignore_ascii_case(wanted)) {
                    flatten(effects, target, out);
                }
            }
            other => out.push(other),
        }
    }
}

#[derive(Default)]
struct Plan {
    changes: Vec<Change>,
    events: Vec<String>,
    lines: Vec<String>,
    win: Option<Outcome>,
}

/// Order the effects: flags and unlocks, then consumption, then winning.
fn plan(state: &GameState, player: &Player, item: &Item, effects: &[&UseEffect]) -> Plan {
    let mut plan = Plan::default();
    let mut written: BTreeMap<&str, &FlagValue> = BTreeMap::new();
    let mut unlocked: Vec<(&str, &str)> = Vec::new();

    for effect in effects {
        match effect {
            UseEffect::SetFlag { flag, value } => {
                let previous = match written.get(flag.as_str()) {
                    Some(v) => Some((*v).clone()),
                    None => state.global_flags.get(flag).cloned(),
                };
                written.insert(flag, value);
                plan.changes.push(Change::FlagSet {
                    flag: flag.clone(),
                    previous,
                    value: value.clone(),
                });
                plan.events.push(format!("flag_set:{flag}"));
            }
            UseEffect::UnlockExit { room, direction } => {
                let locked = state
                    .room(room)
                    .is_some_and(|r| r.access_requirements.contains_key(direction));
                let key = (room.as_str(), direction.as_str());
                if locked && !unlocked.contains(&key) {
                    unlocked.push(key);
                    plan.changes.push(Change::ExitUnlocked {
                        room: room.clone(),
                        direction: direction.clone(),
                    });
                    plan.events.push(format!("exit_unlocked:{room}:{direction}"));
                    plan.lines.push(format!("The {} unlocks the way {direction}.", item.name));
                }
            }
            _ => {}
        }
    }

    if effects.iter().any(|e| matches!(e, UseEffect::Consume)) {
        plan.changes.push(Change::ItemConsumed {
            item: item.id.clone(),
            from: ItemLocation::Player(player.id.clone()),
        });
        plan.events.push(format!("item_consumed:{}", item.id));
        plan.lines.push(format!("The {} is consumed.", item.name));
    }

    for effect in effects {
        if let UseEffect::WinGame { message } = effect {
            if let Some(text) = message {
                plan.lines.push(text.clone());
            }
            if plan.win.is_none() {
                plan.events.push("game_won".to_string());
                plan.win = Some(Outcome::Won {
                    condition: format!("use:{}", item.id),
                });
            }
        }
    }

    plan
}
