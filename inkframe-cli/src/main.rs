//! Inkframe — e-ink web kiosk orchestrator CLI.
//!
//! # Usage
//!
//! ```text
//! inkframe start [--width <px>] [--height <px>]
//! inkframe status
//! inkframe stop
//! inkframe config show
//! inkframe config check <file>
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, start::StartArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "inkframe",
    version,
    about = "Drive a rotating set of web screens on an e-ink kiosk",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the display daemon in the foreground.
    Start(StartArgs),

    /// Query daemon runtime status over the control socket.
    Status,

    /// Request graceful daemon shutdown over the control socket.
    Stop,

    /// Inspect display configuration documents.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Start(args) => args.run(),
        Commands::Status => commands::daemon::status(),
        Commands::Stop => commands::daemon::stop(),
        Commands::Config { command } => commands::config::run(command),
    }
}
