use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("Permission denied")]
    PermissionDenied,

    #[error("Failed to create log file {}: {source}", path.display())]
    FileCreateFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write to log file {}: {source}", path.display())]
    FileWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read log file {}: {source}", path.display())]
    FileReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid session configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Failed to subscribe to location updates: {reason}")]
    SubscribeFailed { reason: String },

    #[error("Invalid sample on line {line}: \"{input}\" (expected LAT,LON)")]
    InvalidSample { line: usize, input: String },
}

pub(crate) type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_denied_display() {
        assert_eq!(AppError::PermissionDenied.to_string(), "Permission denied");
    }

    #[test]
    fn file_write_display_includes_path() {
        let e = AppError::FileWriteFailed {
            path: PathBuf::from("/tmp/location_log.txt"),
            source: std::io::Error::other("disk full"),
        };
        assert_eq!(
            e.to_string(),
            "Failed to write to log file /tmp/location_log.txt: disk full"
        );
    }

    #[test]
    fn invalid_sample_display() {
        let e = AppError::InvalidSample {
            line: 3,
            input: "north".to_string(),
        };
        assert_eq!(
            e.to_string(),
            r#"Invalid sample on line 3: "north" (expected LAT,LON)"#
        );
    }

    #[test]
    fn invalid_config_display() {
        let e = AppError::InvalidConfig {
            reason: "interval must be positive".to_string(),
        };
        assert_eq!(
            e.to_string(),
            "Invalid session configuration: interval must be positive"
        );
    }

    #[test]
    fn io_source_is_chained() {
        use std::error::Error as _;
        let e = AppError::FileReadFailed {
            path: PathBuf::from("x"),
            source: std::io::Error::other("boom"),
        };
        assert_eq!(e.source().map(|s| s.to_string()), Some("boom".to_string()));
    }
}
