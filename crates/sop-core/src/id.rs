use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a raw identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id!(
    /// Opaque identifier scoping one independent game world.
    GameId
);
string_id!(
    /// Identifier of a room, unique within a scenario.
    RoomId
);
string_id!(
    /// Identifier of an item, unique within a scenario.
    ItemId
);
string_id!(
    /// Identifier of a non-player character.
    NpcId
);
string_id!(
    /// Identifier of a player.
    PlayerId
);

impl GameId {
    /// Generate a fresh random game id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Id given to the single player created when a game starts.
pub const DEFAULT_PLAYER_ID: &str = "player_1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_game_ids_are_unique() {
        assert_ne!(GameId::generate(), GameId::generate());
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = RoomId::new("meadow");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"meadow\"");
        let back: RoomId = serde_json::from_str("\"meadow\"").unwrap();
        assert_eq!(back, id);
    }
}
