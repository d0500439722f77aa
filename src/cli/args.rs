//! CLI argument definitions using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Beacon - real-time event distribution for the cluster dashboard.
#[derive(Parser)]
#[command(name = "beacon")]
#[command(version)]
#[command(about = "Beacon event-stream runtime and diagnostic tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the beacon runtime
    Start(StartArgs),

    /// Validate a configuration file without starting anything
    Check(CheckArgs),
}

// -----------------------------------------------------------------------------
// Start command
// -----------------------------------------------------------------------------

#[derive(Args)]
pub struct StartArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/beacon.toml")]
    pub config: PathBuf,
}

// -----------------------------------------------------------------------------
// Check command
// -----------------------------------------------------------------------------

#[derive(Args)]
pub struct CheckArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/beacon.toml")]
    pub config: PathBuf,
}
