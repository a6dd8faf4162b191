//! Location provider abstraction layer
//!
//! A provider delivers batches of position samples to a callback on its
//! own thread until the subscription is cancelled. Each concrete source
//! (replayed file, simulated walk) implements the `LocationProvider` trait.

pub(crate) mod replay;
pub(crate) mod simulated;

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::core::{PositionSample, SessionConfig};
use crate::error::{AppError, AppResult};

pub(crate) use replay::ReplayProvider;
pub(crate) use simulated::SimulatedProvider;

/// Receives every batch delivered for one subscription
pub(crate) type SampleCallback = Arc<dyn Fn(Vec<PositionSample>) + Send + Sync>;

/// Identifies one active subscription of a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct SubscriptionHandle(u64);

impl SubscriptionHandle {
    pub(crate) fn new(id: u64) -> Self {
        SubscriptionHandle(id)
    }

    pub(crate) fn id(&self) -> u64 {
        self.0
    }
}

/// Location provider trait - implemented by each sample source
pub(crate) trait LocationProvider: Send + Sync {
    /// Name used on the command line
    fn name(&self) -> &'static str;

    /// Start delivering samples for `config` to `callback`
    fn subscribe(
        &self,
        config: &SessionConfig,
        callback: SampleCallback,
    ) -> AppResult<SubscriptionHandle>;

    /// Stop delivery. No callback runs for `handle` once this returns.
    fn unsubscribe(&self, handle: SubscriptionHandle);

    /// True once a finite source has delivered everything it has
    fn is_exhausted(&self, _handle: SubscriptionHandle) -> bool {
        false
    }
}

/// Cancellation view handed to a delivery thread
pub(crate) struct DeliveryControl {
    cancelled: Arc<AtomicBool>,
}

impl DeliveryControl {
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `duration`, waking early on cancellation.
    /// Returns false if the subscription was cancelled.
    pub(crate) fn pause(&self, duration: Duration) -> bool {
        const SLICE: Duration = Duration::from_millis(10);
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep(SLICE.min(deadline - now));
        }
    }
}

struct Subscription {
    cancelled: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}

/// Delivery threads owned by a provider, keyed by handle
pub(crate) struct Subscriptions {
    next_id: AtomicU64,
    active: Mutex<HashMap<SubscriptionHandle, Subscription>>,
}

impl Subscriptions {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Run `deliver` on a new thread as one subscription
    pub(crate) fn spawn<F>(&self, provider: &str, deliver: F) -> AppResult<SubscriptionHandle>
    where
        F: FnOnce(&DeliveryControl) + Send + 'static,
    {
        let handle = SubscriptionHandle::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        let cancelled = Arc::new(AtomicBool::new(false));
        let finished = Arc::new(AtomicBool::new(false));

        let control = DeliveryControl {
            cancelled: Arc::clone(&cancelled),
        };
        let done = Arc::clone(&finished);
        let thread = thread::Builder::new()
            .name(format!("{provider}-{}", handle.id()))
            .spawn(move || {
                deliver(&control);
                done.store(true, Ordering::Release);
            })
            .map_err(|e| AppError::SubscribeFailed {
                reason: e.to_string(),
            })?;

        self.active.lock().insert(
            handle,
            Subscription {
                cancelled,
                finished,
                thread,
            },
        );
        debug!(provider, handle = handle.id(), "subscribed");
        Ok(handle)
    }

    /// Cancel and join; unknown handles are ignored
    pub(crate) fn cancel(&self, handle: SubscriptionHandle) {
        let Some(sub) = self.active.lock().remove(&handle) else {
            return;
        };
        sub.cancelled.store(true, Ordering::Release);
        if sub.thread.join().is_err() {
            warn!(handle = handle.id(), "delivery thread panicked");
        }
        debug!(handle = handle.id(), "unsubscribed");
    }

    pub(crate) fn is_finished(&self, handle: SubscriptionHandle) -> bool {
        self.active
            .lock()
            .get(&handle)
            .is_none_or(|sub| sub.finished.load(Ordering::Acquire))
    }
}

impl Drop for Subscriptions {
    fn drop(&mut self) {
        let handles: Vec<_> = self.active.lock().keys().copied().collect();
        for handle in handles {
            self.cancel(handle);
        }
    }
}
