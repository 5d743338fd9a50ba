//! Environmental sensors: temperature/humidity and RGB color.

use wheelbot_types::WheelbotError;

/// One temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimateReading {
    pub temperature_c: f64,
    pub humidity_percent: f64,
}

pub trait ClimateSensor: Send {
    fn id(&self) -> &str;

    /// Take one sample. Drivers with a checksum report a bad frame as
    /// [`WheelbotError::SensorFault`].
    fn read_climate(&mut self) -> Result<ClimateReading, WheelbotError>;
}

/// Raw channel counts from an RGB sensor, `c` being the clear channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RgbReading {
    pub r: u16,
    pub g: u16,
    pub b: u16,
    pub c: u16,
}

pub trait ColorSensor: Send {
    fn id(&self) -> &str;

    fn read_rgb(&mut self) -> Result<RgbReading, WheelbotError>;
}
