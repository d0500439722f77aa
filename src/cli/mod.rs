//! Beacon CLI - command-line interface.
//!
//! Provides the binary entry points:
//! - `beacon start` - Start the event-distribution runtime
//! - `beacon check` - Validate a configuration file and exit

mod args;
pub mod commands;

pub use args::{CheckArgs, Cli, Commands, StartArgs};
