//! Append-only log store
//!
//! Owns the single text file the sessions write to. Every operation opens
//! the file, does its work and closes it again while holding the store
//! lock, so readers never see half of an entry.

mod path;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Local, NaiveDateTime};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{LogEntry, format_entry, format_start_marker};
use crate::error::{AppError, AppResult};

pub(crate) use path::resolve_log_path;

pub(crate) struct LogStore {
    path: PathBuf,
    lock: Mutex<()>,
    degraded: AtomicBool,
    degraded_reported: AtomicBool,
}

impl LogStore {
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
            degraded: AtomicBool::new(false),
            degraded_reported: AtomicBool::new(false),
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// True once any create or write has failed
    pub(crate) fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Relaxed)
    }

    /// True exactly once, for the first caller after the store degraded.
    /// Whoever gets true tells the user.
    pub(crate) fn claim_degraded_notice(&self) -> bool {
        self.is_degraded() && !self.degraded_reported.swap(true, Ordering::Relaxed)
    }

    /// Create the directory and file if needed and write the start marker
    pub(crate) fn initialize(&self) -> AppResult<()> {
        self.initialize_at(Local::now().naive_local())
    }

    pub(crate) fn initialize_at(&self, now: NaiveDateTime) -> AppResult<()> {
        let _guard = self.lock.lock();

        let result = self.create_file().and_then(|()| {
            self.write_locked(&format_start_marker(&now))
                .map_err(|source| AppError::FileWriteFailed {
                    path: self.path.clone(),
                    source,
                })
        });
        match &result {
            Ok(()) => debug!(path = %self.path.display(), "log initialized"),
            Err(e) => {
                self.degraded.store(true, Ordering::Relaxed);
                warn!("{e}");
            }
        }
        result
    }

    fn create_file(&self) -> AppResult<()> {
        let create_failed = |source| AppError::FileCreateFailed {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(create_failed)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map(drop)
            .map_err(create_failed)
    }

    /// Append one formatted entry
    pub(crate) fn append(&self, entry: &LogEntry) -> AppResult<()> {
        let text = format_entry(entry);
        let _guard = self.lock.lock();
        self.write_locked(&text).map_err(|source| {
            self.degraded.store(true, Ordering::Relaxed);
            let err = AppError::FileWriteFailed {
                path: self.path.clone(),
                source,
            };
            warn!("{err}");
            err
        })
    }

    // Caller must hold `lock`. The handle is dropped before returning on
    // every path.
    fn write_locked(&self, text: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }

    /// Whole file as ordered lines. Bytes that are not valid UTF-8 are
    /// replaced rather than failing the read.
    pub(crate) fn read_all(&self) -> AppResult<Vec<String>> {
        let bytes = {
            let _guard = self.lock.lock();
            fs::read(&self.path).map_err(|source| AppError::FileReadFailed {
                path: self.path.clone(),
                source,
            })?
        };
        Ok(String::from_utf8_lossy(&bytes)
            .lines()
            .map(str::to_string)
            .collect())
    }
}
