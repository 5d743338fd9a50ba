//! Fixed-interval scan timer driven by the caller's clock.

use std::time::{Duration, Instant};

/// Fires at most once per `interval`.
///
/// The first [`check`][Self::check] always fires. Time is supplied by the
/// caller so tests can step it deterministically.
#[derive(Debug, Clone)]
pub struct PeriodTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl PeriodTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms))
    }

    /// `true` when `interval` has elapsed since the last firing; the timer
    /// then restarts from `now`.
    pub fn check(&mut self, now: Instant) -> bool {
        let due = self
            .last
            .is_none_or(|last| now.saturating_duration_since(last) >= self.interval);
        if due {
            self.last = Some(now);
        }
        due
    }
}
