//! Win and lose predicates over the game state.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::entity::Player;
use crate::id::{ItemId, RoomId};
use crate::state::GameState;
use crate::value::FlagValue;

/// A declarative predicate tested after every state-changing action.
///
/// Scenario files may use the tagged object form or a shorthand string:
/// `reach_room:<room>`, `has_item:<item>`, `flag:<name>=<value>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Condition {
    /// A global flag equals the target value.
    FlagEquals {
        /// Flag name.
        flag: String,
        /// Expected value.
        value: FlagValue,
    },
    /// The acting player holds the item.
    HasItem {
        /// Item id.
        item: ItemId,
    },
    /// The acting player stands in the room.
    InRoom {
        /// Room id.
        room: RoomId,
    },
}

impl Condition {
    /// Evaluate the condition for a player against the current state.
    pub fn evaluate(&self, state: &GameState, player: &Player) -> bool {
        match self {
            Self::FlagEquals { flag, value } => state.global_flags.get(flag) == Some(value),
            Self::HasItem { item } => player.has_item(item),
            Self::InRoom { room } => &player.location == room,
        }
    }

    /// Parse the shorthand string form.
    pub fn parse_shorthand(s: &str) -> Result<Self, String> {
        let (kind, arg) = s
            .split_once(':')
            .ok_or_else(|| format!("condition \"{s}\" is missing a ':'"))?;
        let arg = arg.trim();
        if arg.is_empty() {
            return Err(format!("condition \"{s}\" has an empty argument"));
        }
        match kind.trim() {
            "reach_room" | "in_room" => Ok(Self::InRoom {
                room: RoomId::new(arg),
            }),
            "has_item" => Ok(Self::HasItem {
                item: ItemId::new(arg),
            }),
            "flag" => {
                let (flag, value) = match arg.split_once('=') {
                    Some((flag, raw)) => (flag.trim(), parse_value(raw.trim())),
                    None => (arg, FlagValue::Boolean(true)),
                };
                Ok(Self::FlagEquals {
                    flag: flag.to_string(),
                    value,
                })
            }
            other => Err(format!("unknown condition kind \"{other}\"")),
        }
    }
}

fn parse_value(raw: &str) -> FlagValue {
    serde_json::from_str(raw).unwrap_or_else(|_| FlagValue::String(raw.to_string()))
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FlagEquals { flag, value } => write!(f, "flag:{flag}={value}"),
            Self::HasItem { item } => write!(f, "has_item:{item}"),
            Self::InRoom { room } => write!(f, "reach_room:{room}"),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ConditionRepr {
    Shorthand(String),
    Tagged(TaggedCondition),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum TaggedCondition {
    FlagEquals {
        flag: String,
        value: FlagValue,
    },
    HasItem {
        item: ItemId,
    },
    #[serde(alias = "reach_room")]
    InRoom {
        room: RoomId,
    },
}

impl<'de> Deserialize<'de> for Condition {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = ConditionRepr::deserialize(deserializer)?;
        Self::try_from(repr).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<ConditionRepr> for Condition {
    type Error = String;

    fn try_from(repr: ConditionRepr) -> Result<Self, Self::Error> {
        match repr {
            ConditionRepr::Shorthand(s) => Self::parse_shorthand(&s),
            ConditionRepr::Tagged(TaggedCondition::FlagEquals { flag, value }) => {
                Ok(Self::FlagEquals { flag, value })
            }
            ConditionRepr::Tagged(TaggedCondition::HasItem { item }) => Ok(Self::HasItem { item }),
            ConditionRepr::Tagged(TaggedCondition::InRoom { room }) => Ok(Self::InRoom { room }),
        }
    }
}
