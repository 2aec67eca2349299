//! Melisma CLI - Karaoke Song Document Toolbox
//!
//! Command-line interface for the Melisma song document engine.

use clap::Parser;
use env_logger::Env;
use log::info;

use melisma::cli::{Cli, Commands};
use melisma::Result;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    info!("Melisma v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Some(cmd) => handle_command(cmd),
        None => {
            println!("Melisma v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Check {
            file,
            json,
            max_per_kind,
        } => melisma::cli::commands::check(&file, json, max_per_kind),
        Commands::Convert {
            input,
            output,
            to_version,
        } => melisma::cli::commands::convert(&input, &output, to_version.as_deref()),
        Commands::Tags { file, json } => melisma::cli::commands::tags(&file, json),
        Commands::Normalize { file, output } => {
            melisma::cli::commands::normalize(&file, output.as_deref())
        }
    }
}
