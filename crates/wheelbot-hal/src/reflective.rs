//! Infrared reflective line sensors.
//!
//! The raw [`AnalogInput`] is wrapped by [`ReflectiveLineSensor`], which
//! turns it into a [`LineSensor`]: a line is present when the sampled value
//! is strictly above the threshold. The analog pin is sampled at most once
//! per settle interval; between samples the last result is reported.

use std::time::{Duration, Instant};

use tracing::warn;
use wheelbot_types::WheelbotError;

/// A raw analog pin.
pub trait AnalogInput: Send {
    fn id(&self) -> &str;

    /// Read the current raw value.
    fn read_analog(&mut self) -> Result<u16, WheelbotError>;
}

/// Binary line presence under one sensor.
pub trait LineSensor: Send {
    fn id(&self) -> &str;

    /// `true` while the sensor sees a line. `now` is the caller's tick time.
    fn is_line_detected(&mut self, now: Instant) -> bool;
}

/// Threshold and resampling wrapper around an [`AnalogInput`].
pub struct ReflectiveLineSensor {
    input: Box<dyn AnalogInput>,
    threshold: u16,
    settle: Duration,
    last_sample: Option<Instant>,
    detected: bool,
}

impl ReflectiveLineSensor {
    pub fn new(input: Box<dyn AnalogInput>, threshold: u16, settle: Duration) -> Self {
        Self {
            input,
            threshold,
            settle,
            last_sample: None,
            detected: false,
        }
    }
}

impl LineSensor for ReflectiveLineSensor {
    fn id(&self) -> &str {
        self.input.id()
    }

    fn is_line_detected(&mut self, now: Instant) -> bool {
        let due = self
            .last_sample
            .is_none_or(|last| now.saturating_duration_since(last) >= self.settle);
        if due {
            self.last_sample = Some(now);
            match self.input.read_analog() {
                Ok(value) => self.detected = value > self.threshold,
                Err(e) => warn!(sensor = %self.input.id(), error = %e, "analog read failed"),
            }
        }
        self.detected
    }
}
