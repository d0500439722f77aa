//! CLI command implementations.

use crate::cli::args::{CheckArgs, StartArgs};
use crate::core::config::{Config, TicketMode};
use crate::ops::telemetry;
use anyhow::Result;
use std::env;

/// Load the configuration, bring up logging, and idle until shutdown.
///
/// The stream transport, permission engine, and ticket source are injected
/// by an embedding server; standalone start only validates and reports the
/// configuration it would hand to them.
pub async fn run_start(args: StartArgs) -> Result<()> {
    // Set config path via environment so Config::load_from_env picks it up
    env::set_var("BEACON_CONFIG", args.config.display().to_string());

    let config = Config::load_from_env()?;
    let _log_handle = telemetry::init_tracing(config.telemetry.log_level.as_deref())?;

    match config.ticket_mode() {
        TicketMode::Disabled => {
            // Matches the behavior of a missing tickets integration: degrade, do not crash.
            tracing::warn!("no github configuration found, tickets feature disabled");
        }
        TicketMode::SingleReload => {
            tracing::info!("ticket source configured without a poll interval, single reload mode");
        }
        TicketMode::Recurring(interval) => {
            tracing::info!(
                interval_seconds = interval.as_secs(),
                repository = config
                    .github
                    .as_ref()
                    .and_then(|g| g.repository.as_deref())
                    .unwrap_or_default(),
                "ticket source configured for recurring polls"
            );
        }
    }

    tracing::info!(
        heartbeat_interval_ms = config.stream.heartbeat_interval_ms,
        "configuration loaded"
    );
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutdown signal received");
    Ok(())
}

pub fn run_check(args: CheckArgs) -> Result<()> {
    let config = Config::load(&args.config)?;
    println!("{} is valid", args.config.display());
    if config.github.is_none() {
        println!("note: no [github] section, tickets feature will be disabled");
    }
    Ok(())
}
