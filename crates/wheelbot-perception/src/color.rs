//! RGB color classification.
//!
//! Channels are normalized by their sum and compared against fixed ratio
//! bands, first match wins. Total darkness is `Black`; nothing matching is
//! `Uncertain`.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::warn;
use wheelbot_hal::ColorSensor;

use crate::period::PeriodTimer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorClass {
    /// No reading taken yet.
    Unknown,
    /// The last read failed.
    Error,
    Red,
    Green,
    Blue,
    Yellow,
    Magenta,
    Cyan,
    White,
    Black,
    Uncertain,
}

impl ColorClass {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorClass::Unknown => "Unknown",
            ColorClass::Error => "Error",
            ColorClass::Red => "Red",
            ColorClass::Green => "Green",
            ColorClass::Blue => "Blue",
            ColorClass::Yellow => "Yellow",
            ColorClass::Magenta => "Magenta",
            ColorClass::Cyan => "Cyan",
            ColorClass::White => "White",
            ColorClass::Black => "Black",
            ColorClass::Uncertain => "Uncertain",
        }
    }

    /// Classify raw channel counts.
    pub fn classify(red: u16, green: u16, blue: u16) -> Self {
        let total = f64::from(red) + f64::from(green) + f64::from(blue);
        if total == 0.0 {
            return ColorClass::Black;
        }
        let r = f64::from(red) / total;
        let g = f64::from(green) / total;
        let b = f64::from(blue) / total;

        if r > 0.4 && g < 0.3 && b < 0.3 {
            ColorClass::Red
        } else if g > 0.35 && r < 0.35 && b < 0.35 {
            ColorClass::Green
        } else if b > 0.3 && r < 0.4 && g < 0.4 {
            ColorClass::Blue
        } else if r > 0.3 && g > 0.4 && b < 0.3 {
            ColorClass::Yellow
        } else if r > 0.4 && b > 0.5 && g < 0.4 {
            ColorClass::Magenta
        } else if g > 0.4 && b > 0.5 && r < 0.4 {
            ColorClass::Cyan
        } else if r > 0.3 && g > 0.3 && b > 0.3 {
            ColorClass::White
        } else {
            ColorClass::Uncertain
        }
    }
}

impl fmt::Display for ColorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct ColorMonitor {
    sensor: Option<Box<dyn ColorSensor>>,
    timer: PeriodTimer,
    color: ColorClass,
}

impl ColorMonitor {
    pub fn new(sensor: Option<Box<dyn ColorSensor>>, scan_interval: Duration) -> Self {
        Self {
            sensor,
            timer: PeriodTimer::new(scan_interval),
            color: ColorClass::Unknown,
        }
    }

    /// Sample and classify if due. Returns `true` when a read was attempted.
    pub fn update(&mut self, now: Instant) -> bool {
        let Some(sensor) = self.sensor.as_mut() else {
            return false;
        };
        if !self.timer.check(now) {
            return false;
        }
        self.color = match sensor.read_rgb() {
            Ok(rgb) => ColorClass::classify(rgb.r, rgb.g, rgb.b),
            Err(e) => {
                warn!(sensor = %sensor.id(), error = %e, "color read failed");
                ColorClass::Error
            }
        };
        true
    }

    pub fn color(&self) -> ColorClass {
        self.color
    }

    pub fn has_sensor(&self) -> bool {
        self.sensor.is_some()
    }
}
