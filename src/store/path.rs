use std::path::{Path, PathBuf};

use crate::consts::{LOG_FILE_ENV, LOG_FILE_NAME};

/// Default location: the user's documents directory
pub(crate) fn default_log_path() -> PathBuf {
    let documents = dirs::document_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Documents")))
        .unwrap_or_else(|| PathBuf::from("."));
    documents.join(LOG_FILE_NAME)
}

/// Pick the log file: command line, then environment, then config file
pub(crate) fn resolve_log_path(cli: Option<&Path>, config: Option<&Path>) -> PathBuf {
    if let Some(path) = cli {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(LOG_FILE_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(path) = config {
        return expand_home(path);
    }
    default_log_path()
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| path.to_path_buf()),
        Err(_) => path.to_path_buf(),
    }
}
