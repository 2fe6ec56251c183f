use std::path::Path;

use sop_core::ScenarioConfig;

use crate::error::CliResult;

pub fn run(file: &Path) -> CliResult<()> {
    let scenario = ScenarioConfig::from_path(file)?;
    scenario.validate()?;

    println!("  All checks passed for '{}'.", scenario.title);
    println!(
        "  {} rooms, {} items, {} characters",
        scenario.rooms.len(),
        scenario.items.len(),
        scenario.npcs.len()
    );

    Ok(())
}
