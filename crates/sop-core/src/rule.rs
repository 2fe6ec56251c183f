//! Declarative requirements and item-use effects.

use serde::{Deserialize, Serialize};

use crate::id::{ItemId, RoomId};
use crate::value::{FlagValue, Flags};

/// A single precondition checked against the acting player and global flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Requirement {
    /// Every listed item must be in the actor's inventory.
    RequireItems {
        /// Items the actor must hold.
        items: Vec<ItemId>,
    },
    /// Every listed global flag must currently hold the given value.
    RequireFlags {
        /// Flag name to required value.
        flags: Flags,
    },
}

/// Gate on a room exit (or on every entrance into a room).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessRequirement {
    /// Preconditions, all of which must hold.
    #[serde(default)]
    pub requires: Vec<Requirement>,
    /// Text shown to the player when the gate is closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl AccessRequirement {
    /// Create a requirement from a list of preconditions.
    pub fn new(requires: Vec<Requirement>) -> Self {
        Self {
            requires,
            message: None,
        }
    }

    /// Set the text shown when the requirement is unmet.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Items named by any `RequireItems` entry.
    pub fn required_items(&self) -> impl Iterator<Item = &ItemId> {
        self.requires.iter().flat_map(|r| match r {
            Requirement::RequireItems { items } => items.as_slice(),
            Requirement::RequireFlags { .. } => &[][..],
        })
    }

    /// Flags named by any `RequireFlags` entry.
    pub fn required_flags(&self) -> impl Iterator<Item = (&String, &FlagValue)> {
        self.requires
            .iter()
            .filter_map(|r| match r {
                Requirement::RequireFlags { flags } => Some(flags.iter()),
                Requirement::RequireItems { .. } => None,
            })
            .flatten()
    }
}

/// A mutation applied when an item is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UseEffect {
    /// Set a global flag.
    SetFlag {
        /// Flag name; must be declared in the scenario's global flags.
        flag: String,
        /// Value to store (defaults to `true`).
        #[serde(default)]
        value: FlagValue,
    },
    /// Remove the used item from every container.
    Consume,
    /// End the game as a win.
    WinGame {
        /// Optional victory text.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
    /// Drop the access requirement on one exit.
    UnlockExit {
        /// Room owning the exit.
        room: RoomId,
        /// Direction of the exit.
        direction: String,
    },
    /// Effects that only fire when the item is used on a matching target.
    OnTarget {
        /// Target name or id, compared case-insensitively.
        target: String,
        /// Nested effects.
        effects: Vec<UseEffect>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_requirement_json() {
        let json = r#"{"requires":[{"type":"require_items","items":["key"]},
            {"type":"require_flags","flags":{"door_open":true}}],
            "message":"The door is locked."}"#;
        let req: AccessRequirement = serde_json::from_str(json).unwrap();
        assert_eq!(req.required_items().count(), 1);
        assert_eq!(req.required_flags().count(), 1);
        assert_eq!(req.message.as_deref(), Some("The door is locked."));
    }

    #[test]
    fn set_flag_value_defaults_to_true() {
        let effect: UseEffect =
            serde_json::from_str(r#"{"type":"set_flag","flag":"lit"}"#).unwrap();
        assert_eq!(
            effect,
            UseEffect::SetFlag {
                flag: "lit".to_string(),
                value: FlagValue::Boolean(true),
            }
        );
    }

    #[test]
    fn unit_and_nested_effects() {
        let json = r#"[{"type":"consume"},
            {"type":"on_target","target":"dragon","effects":[{"type":"win_game"}]}]"#;
        let effects: Vec<UseEffect> = serde_json::from_str(json).unwrap();
        assert_eq!(effects[0], UseEffect::Consume);
        assert!(matches!(&effects[1], UseEffect::OnTarget { effects, .. } if effects.len() == 1));
    }
}
