//! Location session manager
//!
//! Owns the one active subscription. Provider callbacks push batches into a
//! bounded channel; a single writer thread per session drains it into the
//! log store, so entries land in arrival order and never interleave.

mod command;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::consts::SAMPLE_CHANNEL_CAPACITY;
use crate::core::{LogEntry, PositionSample, SessionConfig};
use crate::error::{AppError, AppResult};
use crate::notify::{Notice, Notifier, ReadBack};
use crate::permission::{Capability, PermissionAuthority};
use crate::provider::{LocationProvider, SampleCallback, SubscriptionHandle};
use crate::store::LogStore;

pub(crate) use command::{Command, Outcome};

type Batch = Vec<PositionSample>;

/// Result of `stop`: what the session did plus the read-back
#[derive(Debug, Clone, Default, Serialize)]
pub(crate) struct StopReport {
    /// False when stop was called with no session running
    pub(crate) was_active: bool,
    pub(crate) samples_logged: u64,
    pub(crate) write_failures: u64,
    /// The log file could not be created or written at some point
    pub(crate) storage_degraded: bool,
    #[serde(flatten)]
    pub(crate) readback: ReadBack,
}

#[derive(Default)]
struct SessionCounters {
    delivered: AtomicU64,
    logged: AtomicU64,
    failed: AtomicU64,
}

struct ActiveSession {
    config: SessionConfig,
    handle: SubscriptionHandle,
    // Only sender for the session channel; taking it closes the channel.
    sender: Arc<Mutex<Option<SyncSender<Batch>>>>,
    writer: JoinHandle<()>,
    counters: Arc<SessionCounters>,
}

#[derive(Default)]
enum SessionState {
    #[default]
    Idle,
    Active(ActiveSession),
}

pub(crate) struct SessionManager {
    provider: Arc<dyn LocationProvider>,
    authority: Arc<dyn PermissionAuthority>,
    notifier: Arc<dyn Notifier>,
    store: Arc<LogStore>,
    state: Mutex<SessionState>,
}

impl SessionManager {
    pub(crate) fn new(
        provider: Arc<dyn LocationProvider>,
        authority: Arc<dyn PermissionAuthority>,
        notifier: Arc<dyn Notifier>,
        store: Arc<LogStore>,
    ) -> Self {
        Self {
            provider,
            authority,
            notifier,
            store,
            state: Mutex::new(SessionState::Idle),
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        matches!(*self.state.lock(), SessionState::Active(_))
    }

    /// Configuration of the running session, if any
    pub(crate) fn active_config(&self) -> Option<SessionConfig> {
        match &*self.state.lock() {
            SessionState::Active(session) => Some(session.config),
            SessionState::Idle => None,
        }
    }

    /// Samples written by the running session so far
    pub(crate) fn samples_logged(&self) -> u64 {
        match &*self.state.lock() {
            SessionState::Active(session) => session.counters.logged.load(Ordering::Relaxed),
            SessionState::Idle => 0,
        }
    }

    /// True when the running session's provider has nothing more to send
    pub(crate) fn provider_exhausted(&self) -> bool {
        match &*self.state.lock() {
            SessionState::Active(session) => self.provider.is_exhausted(session.handle),
            SessionState::Idle => true,
        }
    }

    pub(crate) fn execute(&self, command: Command) -> AppResult<Outcome> {
        match command {
            Command::StartLogging(config) => self.start(config).map(|()| Outcome::Started),
            Command::StopLogging => Ok(Outcome::Stopped(self.stop())),
        }
    }

    /// Start a session. A running session is stopped first, once
    /// permission for the new one is settled.
    pub(crate) fn start(&self, config: SessionConfig) -> AppResult<()> {
        config.validate()?;

        if !self.acquire_location_capability() {
            self.notifier.notify(Notice::PermissionDenied);
            return Err(AppError::PermissionDenied);
        }

        // A failed check leaves any running session untouched
        if !self.location_granted() {
            self.notifier.notify(Notice::PermissionNotGranted);
            return Err(AppError::PermissionDenied);
        }

        let mut state = self.state.lock();
        if let SessionState::Active(previous) = std::mem::take(&mut *state) {
            info!(
                handle = previous.handle.id(),
                "start while logging; replacing the running session"
            );
            self.finish(previous);
        }

        let session = self.subscribe(config)?;
        debug!(
            handle = session.handle.id(),
            provider = self.provider.name(),
            priority = %config.priority,
            accuracy = config.accuracy_flag_enabled,
            "session started"
        );
        *state = SessionState::Active(session);
        drop(state);

        self.notifier.status("Logging...");
        self.notifier.notify(Notice::StartedLogging);
        Ok(())
    }

    /// Stop the running session, if any, and read the log back
    pub(crate) fn stop(&self) -> StopReport {
        let previous = std::mem::take(&mut *self.state.lock());

        let mut report = StopReport::default();
        if let SessionState::Active(session) = previous {
            let counters = self.finish(session);
            report.was_active = true;
            report.samples_logged = counters.logged.load(Ordering::Relaxed);
            report.write_failures = counters.failed.load(Ordering::Relaxed);
            self.notifier.status("Logging stopped");
            self.notifier.notify(Notice::StoppedLogging);
        }

        report.storage_degraded = self.store.is_degraded();
        report.readback = self.read_back();
        self.notifier.show_log(&report.readback);
        report
    }

    /// Full log contents; a read failure yields an empty view
    pub(crate) fn read_back(&self) -> ReadBack {
        let lines = self.store.read_all().unwrap_or_else(|e| {
            warn!("{e}");
            Vec::new()
        });
        ReadBack {
            log_file: self.store.path().to_path_buf(),
            lines,
        }
    }

    fn location_granted(&self) -> bool {
        self.authority
            .check_capability(Capability::FineLocation)
            .is_granted()
            || self
                .authority
                .check_capability(Capability::CoarseLocation)
                .is_granted()
    }

    /// Check, and if needed request, location and storage access.
    /// Only the location answer decides; missing storage shows up later as
    /// failed writes.
    fn acquire_location_capability(&self) -> bool {
        let fine = self.authority.check_capability(Capability::FineLocation);
        let storage = self.authority.check_capability(Capability::SharedStorage);
        if fine.is_granted() && storage.is_granted() {
            return true;
        }

        let (tx, rx) = mpsc::channel();
        self.authority.request_capability(
            &[
                Capability::FineLocation,
                Capability::CoarseLocation,
                Capability::SharedStorage,
            ],
            Box::new(move |results| {
                let _ = tx.send(results);
            }),
        );
        let Ok(results) = rx.recv() else {
            warn!("permission request dropped without an answer");
            return false;
        };

        let granted = |kind| {
            results
                .iter()
                .any(|&(k, grant)| k == kind && grant.is_granted())
        };
        if !granted(Capability::SharedStorage) {
            warn!("storage access not granted; log writes may fail");
        }
        granted(Capability::FineLocation) || granted(Capability::CoarseLocation)
    }

    fn subscribe(&self, config: SessionConfig) -> AppResult<ActiveSession> {
        let (tx, rx) = mpsc::sync_channel::<Batch>(SAMPLE_CHANNEL_CAPACITY);
        let counters = Arc::new(SessionCounters::default());
        let writer = spawn_writer(
            rx,
            config,
            Arc::clone(&self.store),
            Arc::clone(&self.notifier),
            Arc::clone(&counters),
        )?;

        let sender = Arc::new(Mutex::new(Some(tx)));
        let callback: SampleCallback = {
            let sender = Arc::clone(&sender);
            let counters = Arc::clone(&counters);
            Arc::new(move |batch: Batch| {
                if batch.is_empty() {
                    return;
                }
                let guard = sender.lock();
                let Some(tx) = guard.as_ref() else {
                    debug!(count = batch.len(), "batch after stop dropped");
                    return;
                };
                counters
                    .delivered
                    .fetch_add(batch.len() as u64, Ordering::Relaxed);
                if tx.send(batch).is_err() {
                    warn!("session writer gone; batch dropped");
                }
            })
        };

        match self.provider.subscribe(&config, callback) {
            Ok(handle) => Ok(ActiveSession {
                config,
                handle,
                sender,
                writer,
                counters,
            }),
            Err(e) => {
                sender.lock().take();
                let _ = writer.join();
                Err(e)
            }
        }
    }

    /// Cancel delivery, drain queued samples and wait for the writer
    fn finish(&self, session: ActiveSession) -> Arc<SessionCounters> {
        self.provider.unsubscribe(session.handle);
        session.sender.lock().take();
        if session.writer.join().is_err() {
            warn!(handle = session.handle.id(), "session writer panicked");
        }
        debug!(
            handle = session.handle.id(),
            delivered = session.counters.delivered.load(Ordering::Relaxed),
            logged = session.counters.logged.load(Ordering::Relaxed),
            "session finished"
        );
        session.counters
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let SessionState::Active(session) = std::mem::take(self.state.get_mut()) {
            self.finish(session);
        }
    }
}

fn spawn_writer(
    rx: Receiver<Batch>,
    config: SessionConfig,
    store: Arc<LogStore>,
    notifier: Arc<dyn Notifier>,
    counters: Arc<SessionCounters>,
) -> AppResult<JoinHandle<()>> {
    thread::Builder::new()
        .name("log-writer".to_string())
        .spawn(move || {
            for batch in rx {
                for sample in &batch {
                    let entry = LogEntry::from_sample(sample, &config);
                    match store.append(&entry) {
                        Ok(()) => {
                            counters.logged.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(_) => {
                            counters.failed.fetch_add(1, Ordering::Relaxed);
                            if store.claim_degraded_notice() {
                                notifier.notify(Notice::StorageDegraded);
                            }
                        }
                    }
                }
            }
        })
        .map_err(|e| AppError::SubscribeFailed {
            reason: format!("cannot start log writer: {e}"),
        })
}
