use std::path::Path;

use colored::Colorize;
use sop_engine::scenarios;

use super::Context;
use crate::error::CliResult;

pub fn run(ctx: &Context, scenario: &str, file: Option<&Path>, name: Option<&str>) -> CliResult<()> {
    let scenario = super::load_scenario(scenario, file)?;
    let sessions = ctx.sessions()?;
    let id = sessions.start_game_with_id(ctx.game().clone(), &scenario, name)?;

    let state = sessions.engine().snapshot(&id)?;
    let player = state
        .primary_player()
        .map(|p| p.id.clone())
        .ok_or_else(|| sop_engine::GameError::InvalidState("game has no player".to_string()))?;
    let look = sessions.engine().look_around(&id, &player)?;

    println!("  Started '{}' as game {}.", scenario.title.bold(), id.to_string().cyan());
    println!();
    println!("{look}");

    Ok(())
}

pub fn list_scenarios() {
    for name in scenarios::NAMES {
        let title = scenarios::by_name(name)
            .and_then(Result::ok)
            .map(|s| s.title)
            .unwrap_or_default();
        println!("  {:<18} {}", name.bold(), title);
    }
}
