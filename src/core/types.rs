//! Core data types for a logging session
//!
//! A session is configured once at start and every position sample it
//! receives is turned into one `LogEntry`.

use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_FASTEST_INTERVAL_MS, DEFAULT_UPDATE_INTERVAL_MS};
use crate::error::{AppError, AppResult};

/// Power/accuracy profile requested from the location provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) enum Priority {
    /// Only passively receive fixes requested by others
    NoPower,
    /// City-level accuracy
    LowPower,
    /// Block-level accuracy (default)
    #[default]
    Balanced,
    /// Most precise fix available
    HighAccuracy,
}

impl Priority {
    /// Label written to the `Priority:` line of a log entry
    pub(crate) fn label(self) -> &'static str {
        match self {
            Priority::NoPower => "No Power",
            Priority::LowPower => "Low Power",
            Priority::Balanced => "Balanced Power Accuracy",
            Priority::HighAccuracy => "High Accuracy",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Settings captured when a session starts; never changed while it runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub(crate) struct SessionConfig {
    pub(crate) priority: Priority,
    pub(crate) update_interval_ms: u64,
    pub(crate) fastest_interval_ms: u64,
    pub(crate) accuracy_flag_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            priority: Priority::default(),
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            fastest_interval_ms: DEFAULT_FASTEST_INTERVAL_MS,
            accuracy_flag_enabled: false,
        }
    }
}

impl SessionConfig {
    pub(crate) fn validate(&self) -> AppResult<()> {
        if self.update_interval_ms == 0 || self.fastest_interval_ms == 0 {
            return Err(AppError::InvalidConfig {
                reason: "update intervals must be greater than zero".to_string(),
            });
        }
        if self.fastest_interval_ms > self.update_interval_ms {
            return Err(AppError::InvalidConfig {
                reason: format!(
                    "fastest interval ({} ms) exceeds update interval ({} ms)",
                    self.fastest_interval_ms, self.update_interval_ms
                ),
            });
        }
        Ok(())
    }
}

/// A single fix delivered by a location provider
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PositionSample {
    /// Local wall-clock time the fix was delivered
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
}

impl PositionSample {
    pub(crate) fn new(timestamp: NaiveDateTime, latitude: f64, longitude: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
        }
    }
}

/// One record of the log file
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LogEntry {
    pub(crate) timestamp: NaiveDateTime,
    pub(crate) latitude: f64,
    pub(crate) longitude: f64,
    pub(crate) priority: Priority,
    pub(crate) accuracy_on: bool,
}

impl LogEntry {
    /// Tag a sample with the settings of the session that received it
    pub(crate) fn from_sample(sample: &PositionSample, config: &SessionConfig) -> Self {
        Self {
            timestamp: sample.timestamp,
            latitude: sample.latitude,
            longitude: sample.longitude,
            priority: config.priority,
            accuracy_on: config.accuracy_flag_enabled,
        }
    }
}
