use crate::id::{ItemId, NpcId, PlayerId, RoomId};

/// Alias for `Result<T, SchemaError>`.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A scenario configuration that cannot become a game.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The document is not valid JSON or is missing required fields.
    #[error("malformed scenario: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The scenario file could not be read.
    #[error("cannot read scenario: {0}")]
    Io(#[from] std::io::Error),

    /// The scenario defines no rooms.
    #[error("scenario defines no rooms")]
    NoRooms,

    /// Two entities of one kind share an id.
    #[error("duplicate {kind} id \"{id}\"")]
    DuplicateId {
        /// Entity kind.
        kind: &'static str,
        /// The repeated id.
        id: String,
    },

    /// The start room does not exist.
    #[error("start room \"{0}\" does not exist")]
    UnknownStartRoom(RoomId),

    /// A connection points at a room that does not exist.
    #[error("room \"{room}\" connects {direction} to unknown room \"{target}\"")]
    DanglingConnection {
        /// Source room.
        room: RoomId,
        /// Direction key.
        direction: String,
        /// Missing target.
        target: RoomId,
    },

    /// Two exits of one room differ only in letter case.
    #[error("room \"{room}\" has exit \"{direction}\" more than once (ignoring case)")]
    DuplicateExit {
        /// Room id.
        room: RoomId,
        /// The repeated direction key.
        direction: String,
    },

    /// An access requirement is keyed by a direction the room does not have.
    #[error("room \"{room}\" has an access requirement on missing exit \"{direction}\"")]
    RequirementOnMissingExit {
        /// Room id.
        room: RoomId,
        /// Direction key.
        direction: String,
    },

    /// A rule refers to an item that does not exist.
    #[error("{context} refers to unknown item \"{item}\"")]
    UnknownItem {
        /// Where the reference appeared.
        context: String,
        /// Missing item.
        item: ItemId,
    },

    /// A rule refers to a room that does not exist.
    #[error("{context} refers to unknown room \"{room}\"")]
    UnknownRoom {
        /// Where the reference appeared.
        context: String,
        /// Missing room.
        room: RoomId,
    },

    /// A rule refers to a flag absent from `global_flags`.
    #[error("{context} refers to undeclared flag \"{flag}\"")]
    UndeclaredFlag {
        /// Where the reference appeared.
        context: String,
        /// Missing flag.
        flag: String,
    },

    /// An item location string resolves to no container.
    #[error("item \"{item}\" is located in unknown container \"{location}\"")]
    DanglingItemLocation {
        /// Item id.
        item: ItemId,
        /// Raw location string.
        location: String,
    },

    /// A room lists an item whose own location says otherwise.
    #[error("room \"{room}\" lists item \"{item}\" but the item is located elsewhere")]
    ItemLocationMismatch {
        /// Room id.
        room: RoomId,
        /// Item id.
        item: ItemId,
    },

    /// A room lists an NPC standing somewhere else.
    #[error("room \"{room}\" lists NPC \"{npc}\" but the NPC stands elsewhere")]
    NpcLocationMismatch {
        /// Room id.
        room: RoomId,
        /// NPC id.
        npc: NpcId,
    },

    /// An NPC stands in a room that does not exist.
    #[error("NPC \"{npc}\" stands in unknown room \"{room}\"")]
    NpcInUnknownRoom {
        /// NPC id.
        npc: NpcId,
        /// Missing room.
        room: RoomId,
    },

    /// A dialogue state is absent from its own tree.
    #[error("NPC \"{npc}\" references dialogue state \"{state}\" missing from its tree")]
    UnknownDialogueState {
        /// NPC id.
        npc: NpcId,
        /// Missing state key.
        state: String,
    },

    /// An NPC has no dialogue at all.
    #[error("NPC \"{0}\" has an empty dialogue tree")]
    EmptyDialogueTree(NpcId),

    /// An NPC lists an item whose own location says otherwise.
    #[error("NPC \"{npc}\" carries item \"{item}\" but the item is located elsewhere")]
    NpcInventoryMismatch {
        /// NPC id.
        npc: NpcId,
        /// Item id.
        item: ItemId,
    },

    /// An unlock effect names an exit that does not exist.
    #[error("item \"{item}\" unlocks missing exit {direction} of room \"{room}\"")]
    UnknownExit {
        /// Item carrying the effect.
        item: ItemId,
        /// Room id.
        room: RoomId,
        /// Direction key.
        direction: String,
    },
}

/// A delta that no longer matches the state it is applied to.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The player does not exist.
    #[error("player not found: {0}")]
    PlayerNotFound(PlayerId),

    /// The room does not exist.
    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    /// The item does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// The NPC does not exist.
    #[error("npc not found: {0}")]
    NpcNotFound(NpcId),

    /// A change's recorded precondition does not hold.
    #[error("stale change: {0}")]
    Stale(String),

    /// The game has ended and accepts no more changes.
    #[error("game has ended")]
    Ended,
}
