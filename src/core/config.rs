use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn default_heartbeat_interval_ms() -> u64 {
    15_000
}

fn default_shutdown_grace_base_ms() -> u64 {
    2_000
}

fn default_shutdown_grace_jitter_ms() -> u64 {
    1_000
}

fn default_reconnect_base_ms() -> u64 {
    1_000
}

fn default_reconnect_jitter_ms() -> u64 {
    1_000
}

/// Top-level configuration for the beacon runtime.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamSettings,
    /// Ticket source settings. Absence disables the poll bridge entirely;
    /// that is a warning at startup, not an error.
    #[serde(default)]
    pub github: Option<GitHubConfig>,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Timer settings for streaming sessions.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamSettings {
    /// Interval between heartbeat pushes keeping the connection alive.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,
    /// Base grace window between the close signal and forced termination.
    #[serde(default = "default_shutdown_grace_base_ms")]
    pub shutdown_grace_base_ms: u64,
    /// Random jitter added to the grace window to desynchronize reconnect storms.
    #[serde(default = "default_shutdown_grace_jitter_ms")]
    pub shutdown_grace_jitter_ms: u64,
    /// Base reconnect hint handed to the client transport.
    #[serde(default = "default_reconnect_base_ms")]
    pub reconnect_base_ms: u64,
    /// Random jitter added to the reconnect hint.
    #[serde(default = "default_reconnect_jitter_ms")]
    pub reconnect_jitter_ms: u64,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            shutdown_grace_base_ms: default_shutdown_grace_base_ms(),
            shutdown_grace_jitter_ms: default_shutdown_grace_jitter_ms(),
            reconnect_base_ms: default_reconnect_base_ms(),
            reconnect_jitter_ms: default_reconnect_jitter_ms(),
        }
    }
}

/// Settings for the external ticket source.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// Recurring poll interval. Unset or zero means a single full reload at
    /// startup and no recurring polls.
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
    /// Repository the ticket tracker lives in, `owner/name` form.
    #[serde(default)]
    pub repository: Option<String>,
}

impl GitHubConfig {
    /// Effective poll interval; filters out the zero sentinel.
    pub fn poll_interval(&self) -> Option<Duration> {
        match self.poll_interval_seconds {
            Some(secs) if secs > 0 => Some(Duration::from_secs(secs)),
            _ => None,
        }
    }
}

/// How the ticket bridge runs under a given configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketMode {
    /// No github section: the tickets feature is disabled.
    Disabled,
    /// Github configured without an interval: one full reload at startup.
    SingleReload,
    /// Recurring polls at the given interval.
    Recurring(Duration),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive, e.g. `info` or `beacon=debug`.
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Load configuration from a path resolved via BEACON_CONFIG or defaults
    /// to `config/beacon.toml`.
    pub fn load_from_env() -> Result<Self> {
        let path = env_config_path();
        Self::load(&path)
    }

    /// Load configuration from a specific file (TOML or JSON based on extension).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path_ref = path.as_ref();
        let data = fs::read_to_string(path_ref)
            .with_context(|| format!("unable to read config {}", path_ref.display()))?;
        let cfg: Self = if is_json(path_ref) {
            serde_json::from_str(&data)
                .with_context(|| format!("invalid JSON config {}", path_ref.display()))?
        } else {
            toml::from_str(&data)
                .with_context(|| format!("invalid TOML config {}", path_ref.display()))?
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Ticket-bridge mode implied by the github section.
    pub fn ticket_mode(&self) -> TicketMode {
        match &self.github {
            None => TicketMode::Disabled,
            Some(github) => match github.poll_interval() {
                None => TicketMode::SingleReload,
                Some(interval) => TicketMode::Recurring(interval),
            },
        }
    }

    /// Validate schema-level invariants before startup.
    pub fn validate(&self) -> Result<()> {
        if self.stream.heartbeat_interval_ms == 0 {
            bail!("stream.heartbeat_interval_ms must be > 0");
        }
        if self.stream.shutdown_grace_base_ms == 0 {
            bail!("stream.shutdown_grace_base_ms must be > 0");
        }
        if let Some(github) = &self.github {
            if let Some(repository) = &github.repository {
                if !repository.contains('/') {
                    bail!("github.repository must be in owner/name form");
                }
            }
        }
        Ok(())
    }
}

fn env_config_path() -> PathBuf {
    if let Ok(path) = std::env::var("BEACON_CONFIG") {
        PathBuf::from(path)
    } else {
        PathBuf::from("config/beacon.toml")
    }
}

fn is_json(path: &Path) -> bool {
    path.extension().map(|ext| ext == "json").unwrap_or(false)
}
