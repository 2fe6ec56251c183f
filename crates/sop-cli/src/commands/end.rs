use colored::Colorize;
use sop_core::GameSummary;
use sop_engine::GameError;
use sop_tools::render_summary;

use super::Context;
use crate::error::{CliError, CliResult};

pub fn run(ctx: &Context, reason: &str) -> CliResult<()> {
    let sessions = ctx.sessions()?;
    let summary = sessions.end_game(ctx.game(), reason)?;
    print_summary(&summary);
    Ok(())
}

pub fn summary(ctx: &Context, json: bool) -> CliResult<()> {
    let engine = ctx.engine()?;
    let summary = match engine.summary(ctx.game()) {
        Ok(summary) => summary,
        Err(GameError::InvalidState(_)) => return Err(CliError::StillActive(ctx.game().clone())),
        Err(e) => return Err(e.into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }
    Ok(())
}

fn print_summary(summary: &GameSummary) {
    let headline = match summary.outcome.as_str() {
        "won" => "You won!".green().bold(),
        "lost" => "You lost.".red().bold(),
        _ => "Game over.".yellow().bold(),
    };
    println!("  {headline}");
    println!();
    println!("{}", render_summary(summary));
}
