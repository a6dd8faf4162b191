/// Timestamp format used in every log line: "19/10/2026 14:03:07"
pub(crate) const TIMESTAMP_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// File name of the log inside the documents directory
pub(crate) const LOG_FILE_NAME: &str = "location_log.txt";

/// Prefix of the line written once per launch
pub(crate) const START_MARKER_PREFIX: &str = "Log start date and time: ";

/// Line terminating every sample entry
pub(crate) const ENTRY_SEPARATOR: &str = "----------";

pub(crate) const DEFAULT_UPDATE_INTERVAL_MS: u64 = 10_000;
pub(crate) const DEFAULT_FASTEST_INTERVAL_MS: u64 = 5_000;

/// Batches buffered between a provider callback and the writer thread
pub(crate) const SAMPLE_CHANNEL_CAPACITY: usize = 64;

/// Environment override for the log file location
pub(crate) const LOG_FILE_ENV: &str = "LOCLOG_LOG_FILE";

/// Environment override for the config file location
pub(crate) const CONFIG_FILE_ENV: &str = "LOCLOG_CONFIG";
