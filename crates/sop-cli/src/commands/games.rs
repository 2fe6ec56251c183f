use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::Context;
use crate::error::{CliError, CliResult};

pub fn list(ctx: &Context) -> CliResult<()> {
    let sessions = ctx.sessions()?;
    let ids = sessions.engine().list_games()?;

    if ids.is_empty() {
        println!("  No saved games.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Game", "Title", "Turn", "Status", "Location"]);

    for id in &ids {
        // One unreadable record should not hide the rest.
        match sessions.status(id) {
            Ok(status) => {
                let state = status
                    .outcome
                    .clone()
                    .unwrap_or_else(|| "active".to_string());
                table.add_row(vec![
                    id.to_string(),
                    status.title,
                    status.turn.to_string(),
                    state,
                    status.location.unwrap_or_default(),
                ]);
            }
            Err(e) => {
                tracing::warn!(game = %id, error = %e, "skipping unreadable game");
                table.add_row(vec![id.to_string(), "?".into(), "-".into(), "unreadable".into(), String::new()]);
            }
        }
    }

    println!("{table}");
    println!();
    println!("  {} games", ids.len());
    Ok(())
}

pub fn reset(ctx: &Context) -> CliResult<()> {
    let state = ctx.sessions()?.reset_game(ctx.game())?;
    println!("  Reset '{}' to turn 0.", state.title.bold());
    Ok(())
}

pub fn delete(ctx: &Context) -> CliResult<()> {
    if ctx.engine()?.delete(ctx.game())? {
        println!("  Deleted game {}.", ctx.game());
        Ok(())
    } else {
        Err(CliError::NoGame(ctx.game().clone()))
    }
}
