//! Line detection.
//!
//! Every scan polls each reflective sensor once and hands the
//! left/forward/right triple to a [`LineListener`]. Sensors are visited in
//! configuration order; when two sensors face the same direction the one
//! listed last determines that direction's value.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use wheelbot_hal::LineSlot;
use wheelbot_types::Direction;
use wheelbot_types::telemetry::{LineReading, LineRecord};

use crate::period::PeriodTimer;

/// Line presence under the left, forward and right sensors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineState {
    pub left: bool,
    pub forward: bool,
    pub right: bool,
}

/// Receives the line triple once per scan.
pub trait LineListener {
    fn on_line(&mut self, state: LineState);
}

/// Result of the most recent scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineSnapshot {
    sensors: BTreeMap<Direction, bool>,
}

impl LineSnapshot {
    pub fn detected(&self, direction: Direction) -> bool {
        self.sensors.get(&direction).copied().unwrap_or(false)
    }

    pub fn state(&self) -> LineState {
        LineState {
            left: self.detected(Direction::Left),
            forward: self.detected(Direction::Forward),
            right: self.detected(Direction::Right),
        }
    }

    pub fn to_record(&self, timestamp: DateTime<Utc>) -> LineRecord {
        LineRecord {
            sensors: self
                .sensors
                .iter()
                .map(|(direction, detected)| (*direction, LineReading::from(*detected)))
                .collect(),
            timestamp,
        }
    }
}

pub struct LineDetector {
    sensors: Vec<LineSlot>,
    timer: PeriodTimer,
    snapshot: LineSnapshot,
}

impl LineDetector {
    pub fn new(sensors: Vec<LineSlot>, scan_interval: Duration) -> Self {
        Self {
            sensors,
            timer: PeriodTimer::new(scan_interval),
            snapshot: LineSnapshot::default(),
        }
    }

    /// Scan if the interval has elapsed and notify `listener`.
    ///
    /// Returns `true` when a scan ran.
    pub fn update(&mut self, now: Instant, listener: &mut dyn LineListener) -> bool {
        if !self.timer.check(now) {
            return false;
        }
        let mut sensors = BTreeMap::new();
        for slot in &mut self.sensors {
            sensors.insert(slot.direction, slot.sensor.is_line_detected(now));
        }
        self.snapshot = LineSnapshot { sensors };
        listener.on_line(self.snapshot.state());
        true
    }

    pub fn snapshot(&self) -> &LineSnapshot {
        &self.snapshot
    }

    pub fn has_sensors(&self) -> bool {
        !self.sensors.is_empty()
    }
}
