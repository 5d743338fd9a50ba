//! [`ObstacleGuard`] – stop/clear hysteresis and distance speed bands.
//!
//! The guard stops when the nearest obstacle is closer than the stop
//! distance and only clears once it is at least the clear distance away.
//! Neither happens while the emergency latch is set. A scan without any
//! reading (`None`) leaves the guard as it is.

use tracing::debug;
use wheelbot_types::config::{ObstaclePolicyConfiguration, SpeedBand};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEvent {
    /// An obstacle came within the stop distance.
    Stop { distance_cm: u32 },
    /// The obstacle moved beyond the clear distance.
    Clear { distance_cm: u32 },
}

#[derive(Debug, Clone)]
pub struct ObstacleGuard {
    stop_cm: u32,
    clear_cm: u32,
    bands: Vec<SpeedBand>,
    stopped: bool,
}

impl ObstacleGuard {
    pub fn new(policy: &ObstaclePolicyConfiguration) -> Self {
        let mut bands = policy.speed_bands.clone();
        bands.sort_by_key(|b| b.below_cm);
        Self {
            stop_cm: policy.stop_distance_cm,
            clear_cm: policy.clear_distance_cm,
            bands,
            stopped: false,
        }
    }

    /// Feed the latest nearest distance.
    pub fn evaluate(&mut self, min_distance: Option<u32>, latched: bool) -> Option<GuardEvent> {
        let distance_cm = min_distance?;
        if latched {
            return None;
        }
        if !self.stopped && distance_cm < self.stop_cm {
            self.stopped = true;
            debug!(distance_cm, "obstacle stop");
            Some(GuardEvent::Stop { distance_cm })
        } else if self.stopped && distance_cm >= self.clear_cm {
            self.stopped = false;
            debug!(distance_cm, "obstacle cleared");
            Some(GuardEvent::Clear { distance_cm })
        } else {
            None
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Maximum speed magnitude allowed at `min_distance`, never above
    /// `max_speed`. Without data the slowest band applies.
    pub fn speed_cap(&self, min_distance: Option<u32>, max_speed: f64) -> f64 {
        let band = match min_distance {
            Some(d) => self.bands.iter().find(|b| d < b.below_cm).map(|b| b.max_speed),
            None => self
                .bands
                .iter()
                .map(|b| b.max_speed)
                .min_by(|a, b| a.total_cmp(b)),
        };
        band.map_or(max_speed, |cap| cap.min(max_speed))
    }
}
