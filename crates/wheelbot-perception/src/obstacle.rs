//! Obstacle detection over every enabled ranging sensor.
//!
//! Each scan reads all rangers once and rebuilds the [`ObstacleSnapshot`]
//! wholesale. Failed reads are left out of the snapshot, so one dead sensor
//! never hides or skews the others; when several sensors face the same
//! direction the nearest reading wins.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::debug;
use wheelbot_hal::RangerSlot;
use wheelbot_types::Direction;
use wheelbot_types::telemetry::ObstacleRecord;

use crate::period::PeriodTimer;

/// Distances from one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObstacleSnapshot {
    directional: BTreeMap<Direction, u32>,
}

impl ObstacleSnapshot {
    /// Aggregate `(direction, cm)` readings, keeping the nearest per direction.
    pub fn from_readings(readings: impl IntoIterator<Item = (Direction, u32)>) -> Self {
        let mut directional = BTreeMap::new();
        for (direction, cm) in readings {
            directional
                .entry(direction)
                .and_modify(|d: &mut u32| *d = (*d).min(cm))
                .or_insert(cm);
        }
        Self { directional }
    }

    /// Nearest obstacle over all directions; `None` when nothing answered.
    pub fn min_distance(&self) -> Option<u32> {
        self.directional.values().copied().min()
    }

    pub fn distance(&self, direction: Direction) -> Option<u32> {
        self.directional.get(&direction).copied()
    }

    pub fn directional(&self) -> &BTreeMap<Direction, u32> {
        &self.directional
    }

    pub fn to_record(&self, timestamp: DateTime<Utc>) -> ObstacleRecord {
        ObstacleRecord {
            min_distance: self.min_distance(),
            directional: self.directional.clone(),
            timestamp,
        }
    }
}

pub struct ObstacleDetector {
    rangers: Vec<RangerSlot>,
    timer: PeriodTimer,
    snapshot: ObstacleSnapshot,
    scans: u64,
}

impl ObstacleDetector {
    pub fn new(rangers: Vec<RangerSlot>, scan_interval: Duration) -> Self {
        Self {
            rangers,
            timer: PeriodTimer::new(scan_interval),
            snapshot: ObstacleSnapshot::default(),
            scans: 0,
        }
    }

    /// Scan if the scan interval has elapsed. Returns `true` when a new
    /// snapshot was taken.
    pub fn update(&mut self, now: Instant) -> bool {
        if !self.timer.check(now) {
            return false;
        }
        let mut readings = Vec::with_capacity(self.rangers.len());
        for slot in &mut self.rangers {
            match slot.sensor.read_distance_cm() {
                Ok(cm) => readings.push((slot.direction, cm)),
                Err(e) => {
                    debug!(sensor = %slot.sensor.id(), direction = %slot.direction, error = %e, "ranging read failed");
                }
            }
        }
        self.snapshot = ObstacleSnapshot::from_readings(readings);
        self.scans += 1;
        true
    }

    pub fn snapshot(&self) -> &ObstacleSnapshot {
        &self.snapshot
    }

    pub fn min_distance(&self) -> Option<u32> {
        self.snapshot.min_distance()
    }

    /// Number of scans taken so far.
    pub fn scan_count(&self) -> u64 {
        self.scans
    }
}
