//! IoT Commander CLI - discover devices on the local network and drive them
//! through the commands they publish.
//!
//! Output goes to stdout (table or JSON), logs go to stderr, and the exit
//! code tells scripts what kind of failure happened.

mod cli;
mod commands;
mod device;
mod error;
mod logging;
mod output;

use std::time::Duration;

use clap::Parser;
use iot_commander_core::ControlConfig;

use cli::{Cli, Commands};
use error::{exit_codes, CliError};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Warning: {}", e);
    }

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(exit_codes::SUCCESS),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let control = ControlConfig {
        http_port: cli.http_port,
        request_timeout: Duration::from_millis(cli.timeout),
    };

    match cli.command {
        Commands::Discover(args) => commands::run_discover(args, cli.json).await,
        Commands::Schema(args) => commands::run_commands(args, control, cli.json).await,
        Commands::Send(args) => commands::run_send(args, control, cli.json).await,
    }
}
