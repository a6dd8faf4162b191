//! Permission authority
//!
//! Decides whether the process may receive location updates and write to
//! shared storage. Requests are answered asynchronously through a reply
//! callback, the way a platform permission prompt would answer.

use std::path::PathBuf;
use std::thread;

use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Capability {
    FineLocation,
    CoarseLocation,
    SharedStorage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Grant {
    Granted,
    Denied,
}

impl Grant {
    pub(crate) fn is_granted(self) -> bool {
        self == Grant::Granted
    }
}

/// Results for a request, in the order the capabilities were asked for
pub(crate) type PermissionReply = Box<dyn FnOnce(Vec<(Capability, Grant)>) + Send>;

pub(crate) trait PermissionAuthority: Send + Sync {
    fn check_capability(&self, kind: Capability) -> Grant;

    fn request_capability(&self, kinds: &[Capability], reply: PermissionReply);
}

/// Non-interactive authority: location access comes from configuration,
/// storage access from whether the log directory is writable
pub(crate) struct ConfigAuthority {
    location_allowed: bool,
    storage_dir: PathBuf,
}

impl ConfigAuthority {
    pub(crate) fn new(location_allowed: bool, storage_dir: impl Into<PathBuf>) -> Self {
        Self {
            location_allowed,
            storage_dir: storage_dir.into(),
        }
    }

    fn storage_writable(&self) -> bool {
        // The directory is created on first use, so a missing one counts as
        // writable as long as some ancestor is.
        let existing = self.storage_dir.ancestors().find(|p| p.exists());
        match existing.map(std::fs::metadata) {
            Some(Ok(meta)) => meta.is_dir() && !meta.permissions().readonly(),
            Some(Err(e)) => {
                warn!(dir = %self.storage_dir.display(), "cannot inspect storage: {e}");
                false
            }
            None => false,
        }
    }
}

impl PermissionAuthority for ConfigAuthority {
    fn check_capability(&self, kind: Capability) -> Grant {
        let granted = match kind {
            Capability::FineLocation | Capability::CoarseLocation => self.location_allowed,
            Capability::SharedStorage => self.storage_writable(),
        };
        if granted { Grant::Granted } else { Grant::Denied }
    }

    fn request_capability(&self, kinds: &[Capability], reply: PermissionReply) {
        let results: Vec<_> = kinds
            .iter()
            .map(|&kind| (kind, self.check_capability(kind)))
            .collect();
        debug!(?results, "permission request answered");
        if let Err(e) = thread::Builder::new()
            .name("permission-reply".to_string())
            .spawn(move || reply(results))
        {
            // The reply is dropped with the closure; the requester sees a
            // closed channel and treats it as denied.
            warn!("failed to deliver permission result: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;

    /// Authority with fixed answers that counts requests
    pub(crate) struct StaticAuthority {
        location: Mutex<Grant>,
        storage: Grant,
        /// Answer given to a request, if different from `check`
        on_request: Mutex<Option<Grant>>,
        pub(crate) requests: AtomicUsize,
        pub(crate) asked: Mutex<Vec<Capability>>,
    }

    impl StaticAuthority {
        pub(crate) fn granting() -> Self {
            Self::new(Grant::Granted, Grant::Granted, None)
        }

        pub(crate) fn denying() -> Self {
            Self::new(Grant::Denied, Grant::Granted, None)
        }

        pub(crate) fn new(location: Grant, storage: Grant, on_request: Option<Grant>) -> Self {
            Self {
                location: Mutex::new(location),
                storage,
                on_request: Mutex::new(on_request),
                requests: AtomicUsize::new(0),
                asked: Mutex::new(Vec::new()),
            }
        }

        /// Change the answers mid-test
        pub(crate) fn set_location(&self, location: Grant, on_request: Option<Grant>) {
            *self.location.lock() = location;
            *self.on_request.lock() = on_request;
        }
    }

    impl PermissionAuthority for StaticAuthority {
        fn check_capability(&self, kind: Capability) -> Grant {
            match kind {
                Capability::SharedStorage => self.storage,
                _ => *self.location.lock(),
            }
        }

        fn request_capability(&self, kinds: &[Capability], reply: PermissionReply) {
            self.requests.fetch_add(1, Ordering::Relaxed);
            self.asked.lock().extend_from_slice(kinds);
            let results = kinds
                .iter()
                .map(|&k| {
                    let answer = *self.on_request.lock();
                    (k, answer.unwrap_or_else(|| self.check_capability(k)))
                })
                .collect();
            reply(results);
        }
    }

    #[test]
    fn config_authority_location_follows_flag() {
        let dir = tempfile::tempdir().unwrap();
        let allowed = ConfigAuthority::new(true, dir.path());
        let denied = ConfigAuthority::new(false, dir.path());
        assert_eq!(allowed.check_capability(Capability::FineLocation), Grant::Granted);
        assert_eq!(denied.check_capability(Capability::CoarseLocation), Grant::Denied);
    }

    #[test]
    fn missing_storage_dir_is_writable_through_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let authority = ConfigAuthority::new(true, dir.path().join("a").join("b"));
        assert!(authority.check_capability(Capability::SharedStorage).is_granted());
    }

    #[test]
    fn storage_under_a_file_is_denied() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("plain");
        std::fs::write(&file, "x").unwrap();
        let authority = ConfigAuthority::new(true, &file);
        assert_eq!(authority.check_capability(Capability::SharedStorage), Grant::Denied);
    }

    #[test]
    fn request_replies_asynchronously_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let authority = ConfigAuthority::new(false, dir.path());
        let (tx, rx) = mpsc::channel();
        authority.request_capability(
            &[Capability::FineLocation, Capability::SharedStorage],
            Box::new(move |results| {
                let _ = tx.send(results);
            }),
        );
        let results = rx.recv().unwrap();
        assert_eq!(
            results,
            vec![
                (Capability::FineLocation, Grant::Denied),
                (Capability::SharedStorage, Grant::Granted),
            ]
        );
    }
}
