//! CLI command definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Warden - quarantine moderation bot for Telegram group networks
#[derive(Parser, Debug)]
#[command(name = "warden")]
#[command(about = "Quarantine moderation bot for Telegram group networks", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file layered over the defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Connect to Telegram and moderate until interrupted
    Run,

    /// Load and validate the configuration, then print it
    CheckConfig,
}
