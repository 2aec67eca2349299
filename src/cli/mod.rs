//! CLI Module
//!
//! Command-line interface for the Melisma song document engine.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Melisma - karaoke song document toolbox
#[derive(Parser, Debug)]
#[command(name = "melisma")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a song file and report validation issues
    #[command(name = "check")]
    Check {
        /// Path to the song file
        file: PathBuf,

        /// Emit issues as JSON
        #[arg(long)]
        json: bool,

        /// Maximum reported issues per kind
        #[arg(long, default_value_t = 25)]
        max_per_kind: usize,
    },

    /// Convert a song file to another format version
    #[command(name = "convert")]
    Convert {
        /// Input song file
        input: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// Target format version (1.0.0, 1.1.0, 2.0.0); default: source version
        #[arg(long)]
        to_version: Option<String>,
    },

    /// Print the parsed header tags of a song file
    #[command(name = "tags")]
    Tags {
        /// Path to the song file
        file: PathBuf,

        /// Emit tags as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite a song file in canonical form
    #[command(name = "normalize")]
    Normalize {
        /// Path to the song file
        file: PathBuf,

        /// Output path (default: rewrite in place)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
