//! Read-only views for monitoring a game.

use colored::Colorize;
use comfy_table::{ContentArrangement, Table};
use sop_tools::render_status;

use super::Context;
use crate::error::CliResult;

pub fn state(ctx: &Context) -> CliResult<()> {
    let state = ctx.engine()?.snapshot(ctx.game())?;
    println!("{}", serde_json::to_string_pretty(&state)?);
    Ok(())
}

pub fn log(ctx: &Context, json: bool) -> CliResult<()> {
    let entries = ctx.engine()?.log(ctx.game())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Turn", "Action", "Message", "Time"]);
    for entry in &entries {
        table.add_row(vec![
            entry.sequence.to_string(),
            entry.turn.to_string(),
            entry.action.to_string(),
            entry.message.clone(),
            entry.timestamp.format("%H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
    println!();
    println!("  {} entries", entries.len());
    Ok(())
}

pub fn status(ctx: &Context) -> CliResult<()> {
    let status = ctx.sessions()?.status(ctx.game())?;
    let badge = match status.outcome.as_deref() {
        None => "active".green(),
        Some("won") => "won".green().bold(),
        Some("lost") => "lost".red().bold(),
        Some(other) => other.yellow(),
    };
    println!("  [{badge}]");
    println!("{}", render_status(&status));
    Ok(())
}
