//! Text rendering of log records

use chrono::NaiveDateTime;

use crate::consts::{ENTRY_SEPARATOR, START_MARKER_PREFIX, TIMESTAMP_FORMAT};

use super::types::LogEntry;

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Shortest round-trip decimal, keeping ".0" on integral values
pub(crate) fn format_coordinate(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

/// The line written once per launch
pub(crate) fn format_start_marker(ts: &NaiveDateTime) -> String {
    format!("{START_MARKER_PREFIX}{}\n", format_timestamp(ts))
}

/// A complete entry including the trailing separator line
pub(crate) fn format_entry(entry: &LogEntry) -> String {
    format!(
        "Timestamp: {}\nLatitude: {}\nLongitude: {}\nPriority: {}\nAccuracy On: {}\n{ENTRY_SEPARATOR}\n",
        format_timestamp(&entry.timestamp),
        format_coordinate(entry.latitude),
        format_coordinate(entry.longitude),
        entry.priority.label(),
        entry.accuracy_on,
    )
}
