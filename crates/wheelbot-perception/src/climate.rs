//! Temperature and humidity sampling.
//!
//! The DHT11 needs a rest between conversions, so besides its poll interval
//! the monitor enforces a minimum spacing between successful reads. A failed
//! read is logged and retried on the next poll.

use std::time::{Duration, Instant};

use tracing::warn;
use wheelbot_hal::{ClimateReading, ClimateSensor};

use crate::period::PeriodTimer;

pub struct ClimateMonitor {
    sensor: Option<Box<dyn ClimateSensor>>,
    poll: PeriodTimer,
    min_interval: Duration,
    last_read: Option<Instant>,
    latest: Option<ClimateReading>,
}

impl ClimateMonitor {
    pub fn new(
        sensor: Option<Box<dyn ClimateSensor>>,
        poll_interval: Duration,
        min_interval: Duration,
    ) -> Self {
        Self {
            sensor,
            poll: PeriodTimer::new(poll_interval),
            min_interval,
            last_read: None,
            latest: None,
        }
    }

    /// Sample if due. Returns the new reading when one was taken.
    pub fn update(&mut self, now: Instant) -> Option<ClimateReading> {
        let sensor = self.sensor.as_mut()?;
        if !self.poll.check(now) {
            return None;
        }
        if let Some(last) = self.last_read {
            if now.saturating_duration_since(last) < self.min_interval {
                return None;
            }
        }
        match sensor.read_climate() {
            Ok(reading) => {
                self.last_read = Some(now);
                self.latest = Some(reading);
                Some(reading)
            }
            Err(e) => {
                warn!(sensor = %sensor.id(), error = %e, "climate read failed");
                None
            }
        }
    }

    /// The most recent successful reading.
    pub fn latest(&self) -> Option<ClimateReading> {
        self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelbot_hal::sim::SimClimate;

    const READING: ClimateReading = ClimateReading {
        temperature_c: 22.5,
        humidity_percent: 41.0,
    };

    #[test]
    fn enforces_minimum_read_spacing() {
        let (sensor, handle) = SimClimate::new(READING);
        let mut monitor = ClimateMonitor::new(
            Some(sensor),
            Duration::from_millis(300),
            Duration::from_millis(1500),
        );
        let t0 = Instant::now();

        assert_eq!(monitor.update(t0), Some(READING));
        for step in 1..5 {
            assert_eq!(monitor.update(t0 + Duration::from_millis(300 * step)), None);
        }
        assert_eq!(monitor.update(t0 + Duration::from_millis(1500)), Some(READING));
        assert_eq!(handle.read_count(), 2);
    }

    #[test]
    fn failed_read_is_retried_on_next_poll() {
        let (sensor, handle) = SimClimate::new(READING);
        handle.set(None);
        let mut monitor = ClimateMonitor::new(
            Some(sensor),
            Duration::from_millis(300),
            Duration::from_millis(1500),
        );
        let t0 = Instant::now();

        assert_eq!(monitor.update(t0), None);
        assert_eq!(monitor.latest(), None);

        handle.set(Some(READING));
        assert_eq!(monitor.update(t0 + Duration::from_millis(300)), Some(READING));
        assert_eq!(monitor.latest(), Some(READING));
    }

    #[test]
    fn absent_sensor_never_reads() {
        let mut monitor =
            ClimateMonitor::new(None, Duration::from_millis(300), Duration::from_millis(1500));
        assert_eq!(monitor.update(Instant::now()), None);
    }
}
