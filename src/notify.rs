//! User-facing sinks: status text, transient notices and the log view

use std::path::PathBuf;

use serde::Serialize;

/// Transient notifications shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Notice {
    StartedLogging,
    StoppedLogging,
    /// The permission request was refused
    PermissionDenied,
    /// Location access was missing when subscribing
    PermissionNotGranted,
    /// The log file could not be created or written
    StorageDegraded,
}

impl Notice {
    pub(crate) fn message(self) -> &'static str {
        match self {
            Notice::StartedLogging => "Started logging location",
            Notice::StoppedLogging => "Stopped logging location",
            Notice::PermissionDenied => "Permission denied",
            Notice::PermissionNotGranted => "Location permission not granted",
            Notice::StorageDegraded => "Log file unavailable; samples are not being saved",
        }
    }
}

/// Full contents of the log file, for display
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct ReadBack {
    pub(crate) log_file: PathBuf,
    pub(crate) lines: Vec<String>,
}

pub(crate) trait Notifier: Send + Sync {
    fn status(&self, text: &str);

    fn notify(&self, notice: Notice);

    fn show_log(&self, readback: &ReadBack);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReadbackMode {
    Text,
    Off,
}

/// Terminal notifier: messages on stderr, the log view on stdout
pub(crate) struct ConsoleNotifier {
    readback: ReadbackMode,
}

impl ConsoleNotifier {
    pub(crate) fn new(readback: ReadbackMode) -> Self {
        Self { readback }
    }
}

impl Notifier for ConsoleNotifier {
    fn status(&self, text: &str) {
        eprintln!("{text}");
    }

    fn notify(&self, notice: Notice) {
        eprintln!("{}", notice.message());
    }

    fn show_log(&self, readback: &ReadBack) {
        if self.readback == ReadbackMode::Text {
            crate::output::print_lines(&readback.lines);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Captures everything the session reports
    #[derive(Default)]
    pub(crate) struct RecordingNotifier {
        pub(crate) statuses: Mutex<Vec<String>>,
        pub(crate) notices: Mutex<Vec<Notice>>,
        pub(crate) shown: Mutex<Vec<ReadBack>>,
    }

    impl RecordingNotifier {
        pub(crate) fn count(&self, notice: Notice) -> usize {
            self.notices.lock().iter().filter(|n| **n == notice).count()
        }
    }

    impl Notifier for RecordingNotifier {
        fn status(&self, text: &str) {
            self.statuses.lock().push(text.to_string());
        }

        fn notify(&self, notice: Notice) {
            self.notices.lock().push(notice);
        }

        fn show_log(&self, readback: &ReadBack) {
            self.shown.lock().push(readback.clone());
        }
    }

    #[test]
    fn notice_messages() {
        assert_eq!(Notice::StartedLogging.message(), "Started logging location");
        assert_eq!(Notice::StoppedLogging.message(), "Stopped logging location");
        assert_eq!(Notice::PermissionDenied.message(), "Permission denied");
        assert_eq!(
            Notice::PermissionNotGranted.message(),
            "Location permission not granted"
        );
    }

    #[test]
    fn readback_serializes_path_and_lines() {
        let rb = ReadBack {
            log_file: PathBuf::from("/tmp/location_log.txt"),
            lines: vec!["a".to_string()],
        };
        let json = serde_json::to_value(&rb).unwrap();
        assert_eq!(json["log_file"], "/tmp/location_log.txt");
        assert_eq!(json["lines"][0], "a");
    }
}
