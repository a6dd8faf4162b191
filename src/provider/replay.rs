//! Replays recorded fixes from a text file
//!
//! One `LAT,LON` pair per line (whitespace also separates); blank lines and
//! `#` comments are skipped.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;

use crate::core::{PositionSample, SessionConfig};
use crate::error::{AppError, AppResult};

use super::{LocationProvider, SampleCallback, SubscriptionHandle, Subscriptions};

pub(crate) fn parse_samples(content: &str) -> AppResult<Vec<(f64, f64)>> {
    let mut points = Vec::new();
    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let invalid = || AppError::InvalidSample {
            line: idx + 1,
            input: line.to_string(),
        };
        let mut parts = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|p| !p.is_empty());
        let (Some(lat), Some(lon), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(invalid());
        };
        let lat: f64 = lat.parse().map_err(|_| invalid())?;
        let lon: f64 = lon.parse().map_err(|_| invalid())?;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
            return Err(invalid());
        }
        points.push((lat, lon));
    }
    Ok(points)
}

/// Delivers a fixed list of fixes, `batch_size` at a time, one batch per
/// fastest interval
pub(crate) struct ReplayProvider {
    points: Arc<Vec<(f64, f64)>>,
    batch_size: usize,
    subscriptions: Subscriptions,
}

impl ReplayProvider {
    pub(crate) fn new(points: Vec<(f64, f64)>, batch_size: usize) -> Self {
        Self {
            points: Arc::new(points),
            batch_size: batch_size.max(1),
            subscriptions: Subscriptions::new(),
        }
    }

    pub(crate) fn from_file(path: &Path, batch_size: usize) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|source| AppError::FileReadFailed {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(parse_samples(&content)?, batch_size))
    }

    /// Keep only the first `limit` fixes
    pub(crate) fn truncate(mut self, limit: usize) -> Self {
        if limit < self.points.len() {
            self.points = Arc::new(self.points[..limit].to_vec());
        }
        self
    }

    pub(crate) fn len(&self) -> usize {
        self.points.len()
    }
}

impl LocationProvider for ReplayProvider {
    fn name(&self) -> &'static str {
        "replay"
    }

    fn subscribe(
        &self,
        config: &SessionConfig,
        callback: SampleCallback,
    ) -> AppResult<SubscriptionHandle> {
        let points = Arc::clone(&self.points);
        let batch_size = self.batch_size;
        let pace = Duration::from_millis(config.fastest_interval_ms);

        self.subscriptions.spawn(self.name(), move |control| {
            for (i, chunk) in points.chunks(batch_size).enumerate() {
                if i > 0 && !control.pause(pace) {
                    return;
                }
                if control.is_cancelled() {
                    return;
                }
                let now = Local::now().naive_local();
                let batch = chunk
                    .iter()
                    .map(|&(lat, lon)| PositionSample::new(now, lat, lon))
                    .collect();
                callback(batch);
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
