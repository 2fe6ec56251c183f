//! Typed play, interactive or one command at a time.

use std::io::{self, BufRead, Write};

use colored::Colorize;
use sop_tools::{Command, GameTools, parse_command};

use super::Context;
use crate::error::CliResult;

fn tools(ctx: &Context) -> CliResult<GameTools> {
    let sessions = ctx.sessions()?;
    let state = sessions.engine().snapshot(ctx.game())?;
    Ok(GameTools::new(sessions, state.scenario))
}

/// Read commands from stdin until `quit` or end of input.
pub fn run(ctx: &Context) -> CliResult<()> {
    let tools = tools(ctx)?;
    println!("{}", tools.look_around());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    loop {
        print!("\n{} ", ">".bold());
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            println!();
            break;
        }

        let command = parse_command(&line);
        let quit = command == Command::Quit;
        let output = tools
            .execute(command)
            .unwrap_or_else(|e| e.to_string());
        println!("{output}");
        if quit {
            break;
        }
    }

    Ok(())
}

/// Run one typed command and print the result.
pub fn run_once(ctx: &Context, input: &str) -> CliResult<()> {
    let tools = tools(ctx)?;
    println!("{}", tools.process(input));
    Ok(())
}
