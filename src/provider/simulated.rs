//! Deterministic walk around an origin point, for demos and tests

use std::time::Duration;

use chrono::Local;

use crate::core::{PositionSample, Priority, SessionConfig};
use crate::error::AppResult;

use super::{LocationProvider, SampleCallback, SubscriptionHandle, Subscriptions};

/// Degrees moved per fix, before jitter
const STEP_DEG: f64 = 0.0001;

pub(crate) struct SimulatedProvider {
    origin: (f64, f64),
    limit: Option<u64>,
    subscriptions: Subscriptions,
}

impl SimulatedProvider {
    pub(crate) fn new(origin: (f64, f64)) -> Self {
        Self {
            origin,
            limit: None,
            subscriptions: Subscriptions::new(),
        }
    }

    /// Stop after `limit` fixes instead of running until cancelled
    pub(crate) fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Coarser profiles wander further from the true track
fn jitter_deg(priority: Priority) -> f64 {
    match priority {
        Priority::HighAccuracy => 0.000_01,
        Priority::Balanced => 0.000_5,
        Priority::LowPower => 0.005,
        Priority::NoPower => 0.01,
    }
}

pub(crate) fn simulated_fix(origin: (f64, f64), priority: Priority, n: u64) -> (f64, f64) {
    let t = n as f64;
    let wobble = jitter_deg(priority) * (t * 1.7).sin();
    let lat = (origin.0 + STEP_DEG * t + wobble).clamp(-90.0, 90.0);
    let mut lon = origin.1 + STEP_DEG * 1.5 * t - wobble;
    if lon > 180.0 {
        lon -= 360.0;
    } else if lon < -180.0 {
        lon += 360.0;
    }
    (lat, lon)
}

impl LocationProvider for SimulatedProvider {
    fn name(&self) -> &'static str {
        "simulated"
    }

    fn subscribe(
        &self,
        config: &SessionConfig,
        callback: SampleCallback,
    ) -> AppResult<SubscriptionHandle> {
        let origin = self.origin;
        let limit = self.limit;
        let priority = config.priority;
        let interval = Duration::from_millis(config.update_interval_ms);

        self.subscriptions.spawn(self.name(), move |control| {
            let mut n = 0u64;
            while limit.is_none_or(|max| n < max) {
                if n > 0 && !control.pause(interval) {
                    return;
                }
                if control.is_cancelled() {
                    return;
                }
                let (lat, lon) = simulated_fix(origin, priority, n);
                callback(vec![PositionSample::new(Local::now().naive_local(), lat, lon)]);
                n += 1;
            }
        })
    }

    fn unsubscribe(&self, handle: SubscriptionHandle) {
        self.subscriptions.cancel(handle);
    }

    fn is_exhausted(&self, handle: SubscriptionHandle) -> bool {
        self.subscriptions.is_finished(handle)
    }
}
