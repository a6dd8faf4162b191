use crate::core::SessionConfig;

use super::StopReport;

/// Commands the user interface can issue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Command {
    StartLogging(SessionConfig),
    StopLogging,
}

#[derive(Debug)]
pub(crate) enum Outcome {
    Started,
    Stopped(StopReport),
}
