//! [`HardwareSet`] – one driver per hardware slot.
//!
//! The orchestrator takes a `HardwareSet` at construction and hands each
//! slot to the subsystem that owns it. Every single-instance slot is an
//! `Option`: a robot without a color sensor simply leaves `color` empty and
//! the color subsystem reports `"Unknown"` forever.

use wheelbot_types::Direction;

use crate::environment::{ClimateSensor, ColorSensor};
use crate::motor::MotorDriver;
use crate::panel::{Indicator, PushButton, TextDisplay};
use crate::ranging::RangeSensor;
use crate::reflective::LineSensor;

/// A ranging sensor together with the direction it faces.
pub struct RangerSlot {
    pub direction: Direction,
    pub sensor: Box<dyn RangeSensor>,
}

/// A line sensor together with the direction it faces.
pub struct LineSlot {
    pub direction: Direction,
    pub sensor: Box<dyn LineSensor>,
}

#[derive(Default)]
pub struct HardwareSet {
    pub rangers: Vec<RangerSlot>,
    pub line_sensors: Vec<LineSlot>,
    pub motors: Option<Box<dyn MotorDriver>>,
    pub display: Option<Box<dyn TextDisplay>>,
    pub button: Option<Box<dyn PushButton>>,
    pub indicator: Option<Box<dyn Indicator>>,
    pub climate: Option<Box<dyn ClimateSensor>>,
    pub color: Option<Box<dyn ColorSensor>>,
}

impl HardwareSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranger(mut self, direction: Direction, sensor: Box<dyn RangeSensor>) -> Self {
        self.rangers.push(RangerSlot { direction, sensor });
        self
    }

    pub fn with_line_sensor(mut self, direction: Direction, sensor: Box<dyn LineSensor>) -> Self {
        self.line_sensors.push(LineSlot { direction, sensor });
        self
    }

    pub fn with_motors(mut self, motors: Box<dyn MotorDriver>) -> Self {
        self.motors = Some(motors);
        self
    }

    pub fn with_display(mut self, display: Box<dyn TextDisplay>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn with_button(mut self, button: Box<dyn PushButton>) -> Self {
        self.button = Some(button);
        self
    }

    pub fn with_indicator(mut self, indicator: Box<dyn Indicator>) -> Self {
        self.indicator = Some(indicator);
        self
    }

    pub fn with_climate(mut self, climate: Box<dyn ClimateSensor>) -> Self {
        self.climate = Some(climate);
        self
    }

    pub fn with_color(mut self, color: Box<dyn ColorSensor>) -> Self {
        self.color = Some(color);
        self
    }
}
