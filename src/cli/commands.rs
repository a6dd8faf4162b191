//! CLI subcommand definitions

use clap::Subcommand;

use super::args::RecordArgs;

/// Main CLI commands
#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Start a logging session, stop it, then show the log
    Record(RecordArgs),
    /// Show the log file contents
    Show {
        /// Only the last N lines
        #[arg(short, long, value_name = "N")]
        tail: Option<usize>,
    },
    /// Print the log file path
    Path,
}
