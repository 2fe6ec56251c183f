//! Scenarios bundled with the engine.

use sop_core::{ScenarioConfig, SchemaResult};

const SIMPLE_ADVENTURE: &str = include_str!("../scenarios/simple_adventure.json");
const DUNGEON_CRAWLER: &str = include_str!("../scenarios/dungeon_crawler.json");

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["simple_adventure", "dungeon_crawler"];

/// Meadow, cottage, and a locked treasure room.
pub fn simple_adventure() -> SchemaResult<ScenarioConfig> {
    ScenarioConfig::from_json(SIMPLE_ADVENTURE)
}

/// A potion, a sword, an old woman, and a dragon.
pub fn dungeon_crawler() -> SchemaResult<ScenarioConfig> {
    ScenarioConfig::from_json(DUNGEON_CRAWLER)
}

/// Look up a bundled scenario by name, ignoring case, `-`, and spaces.
pub fn by_name(name: &str) -> Option<SchemaResult<ScenarioConfig>> {
    let key: String = name
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c.to_ascii_lowercase() })
        .collect();
    match key.as_str() {
        "simple_adventure" | "simple" => Some(simple_adventure()),
        "dungeon_crawler" | "dungeon" => Some(dungeon_crawler()),
        _ => None,
    }
}
