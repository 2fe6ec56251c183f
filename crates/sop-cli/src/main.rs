//! Command-line player and monitor for State of Play games.

mod commands;
mod error;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::commands::Context;

#[derive(Parser)]
#[command(
    name = "sop",
    about = "State of Play: persistent text adventures",
    version,
    propagate_version = true
)]
struct Cli {
    /// Directory holding saved games
    #[arg(long, global = true, env = "SOP_DATA_DIR", default_value = ".sop")]
    data_dir: PathBuf,

    /// Game to act on
    #[arg(short, long, global = true, env = "SOP_GAME", default_value = "default")]
    game: String,

    /// Seconds to wait on the save directory before giving up
    #[arg(long, global = true, env = "SOP_TIMEOUT", default_value = "5")]
    timeout: u64,

    /// Log more (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a scenario file without starting a game
    Check {
        /// Path to a scenario JSON file
        file: PathBuf,
    },

    /// List the bundled scenarios
    Scenarios,

    /// Start a new game, replacing any saved game with the same id
    New {
        /// Bundled scenario name
        #[arg(short, long, default_value = "simple_adventure", conflicts_with = "file")]
        scenario: String,

        /// Scenario JSON file instead of a bundled scenario
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Player name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Play interactively, one command per line, until quit or end of input
    Play,

    /// Run a single command, e.g. `sop do take the key`
    Do {
        /// The command words
        #[arg(required = true, trailing_var_arg = true)]
        input: Vec<String>,
    },

    /// End the game and print its summary
    End {
        /// Why the game ended
        #[arg(short, long, default_value = "ended by player")]
        reason: String,
    },

    /// Print the full game state as JSON
    State,

    /// Show the event log
    Log {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show turn, location, and outcome
    Status,

    /// List saved games
    Games,

    /// Restart the game from its original scenario
    Reset,

    /// Show the summary of an ended game
    Summary {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved game
    Delete,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let ctx = Context::new(cli.data_dir, cli.game.into(), Duration::from_secs(cli.timeout));

    match cli.command {
        Commands::Check { file } => commands::check::run(&file)?,
        Commands::Scenarios => commands::new::list_scenarios(),
        Commands::New {
            scenario,
            file,
            name,
        } => commands::new::run(&ctx, &scenario, file.as_deref(), name.as_deref())?,
        Commands::Play => commands::play::run(&ctx)?,
        Commands::Do { input } => commands::play::run_once(&ctx, &input.join(" "))?,
        Commands::End { reason } => commands::end::run(&ctx, &reason)?,
        Commands::State => commands::inspect::state(&ctx)?,
        Commands::Log { json } => commands::inspect::log(&ctx, json)?,
        Commands::Status => commands::inspect::status(&ctx)?,
        Commands::Games => commands::games::list(&ctx)?,
        Commands::Reset => commands::games::reset(&ctx)?,
        Commands::Summary { json } => commands::end::summary(&ctx, json)?,
        Commands::Delete => commands::games::delete(&ctx)?,
    }

    Ok(())
}
