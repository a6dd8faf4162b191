//! Core module - session types and log record formatting

mod format;
mod types;

pub(crate) use format::{format_entry, format_start_marker};
pub(crate) use types::{LogEntry, PositionSample, Priority, SessionConfig};
