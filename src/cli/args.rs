//! CLI argument definitions
//!
//! Global CLI options and configuration merging logic.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::Config;
use crate::core::{Priority, SessionConfig};
use crate::consts::{DEFAULT_FASTEST_INTERVAL_MS, DEFAULT_UPDATE_INTERVAL_MS};

use super::commands::Commands;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum PriorityArg {
    /// Only receive fixes other apps request
    NoPower,
    /// City-level accuracy
    LowPower,
    /// Block-level accuracy (default)
    Balanced,
    /// Most precise fix available
    HighAccuracy,
}

impl From<PriorityArg> for Priority {
    fn from(arg: PriorityArg) -> Self {
        match arg {
            PriorityArg::NoPower => Priority::NoPower,
            PriorityArg::LowPower => Priority::LowPower,
            PriorityArg::Balanced => Priority::Balanced,
            PriorityArg::HighAccuracy => Priority::HighAccuracy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum ProviderArg {
    /// Replay fixes from a file (--samples)
    #[default]
    Replay,
    /// Deterministic walk around --origin
    Simulated,
}

#[derive(Parser)]
#[command(name = "loclog")]
#[command(about = "Log location fixes to a plain-text file", version)]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Commands,

    /// Log file (default: <documents>/location_log.txt)
    #[arg(long, global = true, value_name = "PATH")]
    pub(crate) log_file: Option<PathBuf>,

    /// Output as JSON
    #[arg(short, long, global = true)]
    pub(crate) json: bool,

    /// Enable debug diagnostics on stderr
    #[arg(long, global = true)]
    pub(crate) debug: bool,
}

/// Options of the `record` command
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct RecordArgs {
    /// Power/accuracy profile
    #[arg(short, long, value_enum)]
    pub(crate) priority: Option<PriorityArg>,

    /// Mark entries with "Accuracy On: true"
    #[arg(short, long)]
    pub(crate) accuracy: bool,

    /// Requested update interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub(crate) interval_ms: Option<u64>,

    /// Fastest accepted update interval in milliseconds
    #[arg(long, value_name = "MS")]
    pub(crate) fastest_interval_ms: Option<u64>,

    /// Where fixes come from
    #[arg(long, value_enum, default_value = "replay")]
    pub(crate) provider: ProviderArg,

    /// Replay input: one LAT,LON per line
    #[arg(short, long, value_name = "FILE")]
    pub(crate) samples: Option<PathBuf>,

    /// Fixes per delivered batch (replay)
    #[arg(long, default_value_t = 1)]
    pub(crate) batch_size: usize,

    /// Stop after this many fixes
    #[arg(short = 'n', long)]
    pub(crate) count: Option<u64>,

    /// Stop after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub(crate) duration_secs: Option<u64>,

    /// Start point of the simulated walk
    #[arg(long, value_name = "LAT,LON", default_value = "37.422,-122.0841", value_parser = parse_origin)]
    pub(crate) origin: (f64, f64),

    /// Refuse location access, as if the user denied the prompt
    #[arg(long)]
    pub(crate) deny_location: bool,

    /// Do not print the log after stopping
    #[arg(short, long)]
    pub(crate) quiet_readback: bool,
}

fn parse_origin(s: &str) -> Result<(f64, f64), String> {
    let invalid = || format!("invalid origin \"{s}\" (expected LAT,LON)");
    let (lat, lon) = s.split_once(',').ok_or_else(invalid)?;
    let lat: f64 = lat.trim().parse().map_err(|_| invalid())?;
    let lon: f64 = lon.trim().parse().map_err(|_| invalid())?;
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return Err(invalid());
    }
    Ok((lat, lon))
}

impl RecordArgs {
    /// Merge config file values (CLI args take precedence)
    pub(crate) fn session_config(&self, config: &Config) -> SessionConfig {
        SessionConfig {
            priority: self
                .priority
                .map(Priority::from)
                .or(config.priority)
                .unwrap_or_default(),
            update_interval_ms: self
                .interval_ms
                .or(config.interval_ms)
                .unwrap_or(DEFAULT_UPDATE_INTERVAL_MS),
            fastest_interval_ms: self
                .fastest_interval_ms
                .or(config.fastest_interval_ms)
                .unwrap_or(DEFAULT_FASTEST_INTERVAL_MS),
            accuracy_flag_enabled: self.accuracy || config.accuracy,
        }
    }

    pub(crate) fn location_allowed(&self, config: &Config) -> bool {
        !self.deny_location && config.location_allowed()
    }
}

impl Cli {
    pub(crate) fn debug_enabled(&self, config: &Config) -> bool {
        self.debug || config.debug
    }
}
