//! In-process simulated drivers for tests and headless runs.
//!
//! Each simulated driver shares its state with a cloneable handle, so a test
//! (or the CLI's desktop mode) can move the driver into the orchestrator and
//! keep steering the simulated world from outside:
//!
//! | Driver | Handle lets you |
//! |---|---|
//! | [`SimRangeSensor`] | set a distance or force a timeout |
//! | [`SimAnalogInput`] | set the raw reflectance value |
//! | [`SimMotors`] | inspect every `(left, right)` write |
//! | [`SimDisplay`] | read the text history, inject failures |
//! | [`SimButton`] | press and release |
//! | [`SimIndicator`] | read the LED state and write count |
//! | [`SimClimate`] / [`SimColor`] | set the next reading or a failure |
//!
//! [`SimHardware::from_config`] builds a full [`HardwareSet`] for a
//! [`RobotConfiguration`] with one simulated driver per configured sensor.
//!
//! # Example
//!
//! ```rust
//! use wheelbot_hal::sim::SimHardware;
//! use wheelbot_types::RobotConfiguration;
//!
//! let config = RobotConfiguration::default_robot();
//! let (hardware, handles) = SimHardware::from_config(&config);
//! assert_eq!(hardware.rangers.len(), 3);
//! handles.rangers["ultrasonic_forward"].set_distance(12);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use wheelbot_types::{RobotConfiguration, SensorKind, WheelbotError};

use crate::environment::{ClimateReading, ClimateSensor, ColorSensor, RgbReading};
use crate::hardware::HardwareSet;
use crate::motor::MotorDriver;
use crate::panel::{Indicator, PushButton, TextDisplay};
use crate::ranging::RangeSensor;
use crate::reflective::{AnalogInput, ReflectiveLineSensor};

/// Distance reported by a fresh simulated ranger.
pub const OPEN_SPACE_CM: u32 = 200;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ────────────────────────────────────────────────────────────────────────────
// Ranging
// ────────────────────────────────────────────────────────────────────────────

/// Controls a [`SimRangeSensor`]. `None` makes the next reads time out.
#[derive(Clone, Debug)]
pub struct SimRangeHandle(Arc<Mutex<Option<u32>>>);

impl SimRangeHandle {
    pub fn set_distance(&self, cm: u32) {
        *lock(&self.0) = Some(cm);
    }

    pub fn set_timeout(&self) {
        *lock(&self.0) = None;
    }
}

pub struct SimRangeSensor {
    id: String,
    distance: Arc<Mutex<Option<u32>>>,
}

impl SimRangeSensor {
    pub fn new(id: impl Into<String>, cm: u32) -> (Box<Self>, SimRangeHandle) {
        let distance = Arc::new(Mutex::new(Some(cm)));
        let handle = SimRangeHandle(Arc::clone(&distance));
        (
            Box::new(Self {
                id: id.into(),
                distance,
            }),
            handle,
        )
    }
}

impl RangeSensor for SimRangeSensor {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_distance_cm(&mut self) -> Result<u32, WheelbotError> {
        (*lock(&self.distance)).ok_or_else(|| WheelbotError::SensorTimeout {
            sensor: self.id.clone(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Analog input
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct SimAnalogHandle(Arc<AtomicU16>);

impl SimAnalogHandle {
    pub fn set(&self, value: u16) {
        self.0.store(value, Ordering::SeqCst);
    }
}

pub struct SimAnalogInput {
    id: String,
    value: Arc<AtomicU16>,
}

impl SimAnalogInput {
    pub fn new(id: impl Into<String>) -> (Box<Self>, SimAnalogHandle) {
        let value = Arc::new(AtomicU16::new(0));
        let handle = SimAnalogHandle(Arc::clone(&value));
        (
            Box::new(Self {
                id: id.into(),
                value,
            }),
            handle,
        )
    }
}

impl AnalogInput for SimAnalogInput {
    fn id(&self) -> &str {
        &self.id
    }

    fn read_analog(&mut self) -> Result<u16, WheelbotError> {
        Ok(self.value.load(Ordering::SeqCst))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Motors
// ────────────────────────────────────────────────────────────────────────────

/// Records every motor write.
#[derive(Clone, Debug, Default)]
pub struct SimMotorHandle(Arc<Mutex<Vec<(i16, i16)>>>);

impl SimMotorHandle {
    pub fn writes(&self) -> Vec<(i16, i16)> {
        lock(&self.0).clone()
    }

    pub fn last(&self) -> Option<(i16, i16)> {
        lock(&self.0).last().copied()
    }

    pub fn write_count(&self) -> usize {
        lock(&self.0).len()
    }

    pub fn clear(&self) {
        lock(&self.0).clear();
    }
}

pub struct SimMotors {
    log: Arc<Mutex<Vec<(i16, i16)>>>,
}

impl SimMotors {
    pub fn new() -> (Box<Self>, SimMotorHandle) {
        let handle = SimMotorHandle::default();
        (
            Box::new(Self {
                log: Arc::clone(&handle.0),
            }),
            handle,
        )
    }
}

impl MotorDriver for SimMotors {
    fn id(&self) -> &str {
        "sim_motors"
    }

    fn set_motors(&mut self, left: i16, right: i16) -> Result<(), WheelbotError> {
        lock(&self.log).push((left, right));
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Panel
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct SimDisplayHandle {
    texts: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
}

impl SimDisplayHandle {
    /// Every text written, oldest first.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.texts).clone()
    }

    pub fn current(&self) -> Option<String> {
        lock(&self.texts).last().cloned()
    }

    /// Make subsequent writes fail with a hardware fault.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

pub struct SimDisplay {
    handle: SimDisplayHandle,
}

impl SimDisplay {
    pub fn new() -> (Box<Self>, SimDisplayHandle) {
        let handle = SimDisplayHandle::default();
        (
            Box::new(Self {
                handle: handle.clone(),
            }),
            handle,
        )
    }
}

impl TextDisplay for SimDisplay {
    fn id(&self) -> &str {
        "sim_display"
    }

    fn set_text(&mut self, text: &str) -> Result<(), WheelbotError> {
        if self.handle.failing.load(Ordering::SeqCst) {
            return Err(WheelbotError::HardwareFault {
                component: "sim_display".to_string(),
                details: "i2c write failed".to_string(),
            });
        }
        lock(&self.handle.texts).push(text.to_string());
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimButtonHandle(Arc<AtomicBool>);

impl SimButtonHandle {
    pub fn press(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SimButton {
    pressed: Arc<AtomicBool>,
}

impl SimButton {
    pub fn new() -> (Box<Self>, SimButtonHandle) {
        let handle = SimButtonHandle::default();
        (
            Box::new(Self {
                pressed: Arc::clone(&handle.0),
            }),
            handle,
        )
    }
}

impl PushButton for SimButton {
    fn id(&self) -> &str {
        "sim_button"
    }

    fn is_pressed(&mut self) -> Result<bool, WheelbotError> {
        Ok(self.pressed.load(Ordering::SeqCst))
    }
}

#[derive(Clone, Debug, Default)]
pub struct SimIndicatorHandle {
    on: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl SimIndicatorHandle {
    pub fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

pub struct SimIndicator {
    handle: SimIndicatorHandle,
}

impl SimIndicator {
    pub fn new() -> (Box<Self>, SimIndicatorHandle) {
        let handle = SimIndicatorHandle::default();
        (
            Box::new(Self {
                handle: handle.clone(),
            }),
            handle,
        )
    }
}

impl Indicator for SimIndicator {
    fn id(&self) -> &str {
        "sim_led"
    }

    fn set_state(&mut self, on: bool) -> Result<(), WheelbotError> {
        self.handle.on.store(on, Ordering::SeqCst);
        self.handle.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn state(&self) -> bool {
        self.handle.is_on()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Environment
// ────────────────────────────────────────────────────────────────────────────

/// Controls a [`SimClimate`]. `None` makes reads fail.
#[derive(Clone, Debug)]
pub struct SimClimateHandle {
    reading: Arc<Mutex<Option<ClimateReading>>>,
    reads: Arc<AtomicUsize>,
}

impl SimClimateHandle {
    pub fn set(&self, reading: Option<ClimateReading>) {
        *lock(&self.reading) = reading;
    }

    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

pub struct SimClimate {
    handle: SimClimateHandle,
}

impl SimClimate {
    pub fn new(reading: ClimateReading) -> (Box<Self>, SimClimateHandle) {
        let handle = SimClimateHandle {
            reading: Arc::new(Mutex::new(Some(reading))),
            reads: Arc::new(AtomicUsize::new(0)),
        };
        (
            Box::new(Self {
                handle: handle.clone(),
            }),
            handle,
        )
    }
}

impl ClimateSensor for SimClimate {
    fn id(&self) -> &str {
        "sim_dht11"
    }

    fn read_climate(&mut self) -> Result<ClimateReading, WheelbotError> {
        self.handle.reads.fetch_add(1, Ordering::SeqCst);
        (*lock(&self.handle.reading)).ok_or_else(|| WheelbotError::SensorFault {
            sensor: "sim_dht11".to_string(),
            details: "checksum mismatch".to_string(),
        })
    }
}

/// Controls a [`SimColor`]. `None` makes reads fail.
#[derive(Clone, Debug)]
pub struct SimColorHandle(Arc<Mutex<Option<RgbReading>>>);

impl SimColorHandle {
    pub fn set(&self, reading: Option<RgbReading>) {
        *lock(&self.0) = reading;
    }
}

pub struct SimColor {
    reading: Arc<Mutex<Option<RgbReading>>>,
}

impl SimColor {
    pub fn new(reading: RgbReading) -> (Box<Self>, SimColorHandle) {
        let reading = Arc::new(Mutex::new(Some(reading)));
        let handle = SimColorHandle(Arc::clone(&reading));
        (Box::new(Self { reading }), handle)
    }
}

impl ColorSensor for SimColor {
    fn id(&self) -> &str {
        "sim_rgb"
    }

    fn read_rgb(&mut self) -> Result<RgbReading, WheelbotError> {
        (*lock(&self.reading)).ok_or_else(|| WheelbotError::SensorFault {
            sensor: "sim_rgb".to_string(),
            details: "no response on i2c".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SimHardware
// ────────────────────────────────────────────────────────────────────────────

/// Handles to every driver created by [`SimHardware::from_config`].
pub struct SimHandles {
    /// Keyed by sensor id.
    pub rangers: HashMap<String, SimRangeHandle>,
    /// Keyed by sensor id.
    pub line: HashMap<String, SimAnalogHandle>,
    pub motors: SimMotorHandle,
    pub display: SimDisplayHandle,
    pub button: SimButtonHandle,
    pub indicator: SimIndicatorHandle,
    pub climate: Option<SimClimateHandle>,
    pub color: Option<SimColorHandle>,
}

pub struct SimHardware;

impl SimHardware {
    /// Build a [`HardwareSet`] with one simulated driver per enabled sensor
    /// in `config`, plus motors, display, button and LED.
    pub fn from_config(config: &RobotConfiguration) -> (HardwareSet, SimHandles) {
        let mut hardware = HardwareSet::new();
        let mut rangers = HashMap::new();
        let mut line = HashMap::new();

        for sensor in config.ranging_sensors() {
            let Some(direction) = sensor.direction else {
                continue;
            };
            let (driver, handle) = SimRangeSensor::new(sensor.id.clone(), OPEN_SPACE_CM);
            hardware = hardware.with_ranger(direction, driver);
            rangers.insert(sensor.id.clone(), handle);
        }

        for sensor in config.line_sensors() {
            let Some(direction) = sensor.direction else {
                continue;
            };
            let (input, handle) = SimAnalogInput::new(sensor.id.clone());
            let reflective = ReflectiveLineSensor::new(
                input,
                config.line.threshold,
                Duration::from_millis(config.line.settle_ms),
            );
            hardware = hardware.with_line_sensor(direction, Box::new(reflective));
            line.insert(sensor.id.clone(), handle);
        }

        let (motors, motor_handle) = SimMotors::new();
        let (display, display_handle) = SimDisplay::new();
        let (button, button_handle) = SimButton::new();
        let (indicator, indicator_handle) = SimIndicator::new();
        hardware = hardware
            .with_motors(motors)
            .with_display(display)
            .with_button(button)
            .with_indicator(indicator);

        let climate = config.first_of_kind(SensorKind::Dht11).map(|_| {
            let (driver, handle) = SimClimate::new(ClimateReading {
                temperature_c: 21.0,
                humidity_percent: 45.0,
            });
            hardware.climate = Some(driver);
            handle
        });

        let color = config.first_of_kind(SensorKind::RgbColor).map(|_| {
            let (driver, handle) = SimColor::new(RgbReading::default());
            hardware.color = Some(driver);
            handle
        });

        (
            hardware,
            SimHandles {
                rangers,
                line,
                motors: motor_handle,
                display: display_handle,
                button: button_handle,
                indicator: indicator_handle,
                climate,
                color,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelbot_types::{Direction, SensorConfiguration};

    #[test]
    fn range_handle_controls_sensor() {
        let (mut sensor, handle) = SimRangeSensor::new("front", 50);
        assert_eq!(sensor.read_distance_cm(), Ok(50));
        handle.set_distance(12);
        assert_eq!(sensor.read_distance_cm(), Ok(12));
        handle.set_timeout();
        assert!(matches!(
            sensor.read_distance_cm(),
            Err(WheelbotError::SensorTimeout { .. })
        ));
    }

    #[test]
    fn motors_record_writes() {
        let (mut motors, handle) = SimMotors::new();
        motors.set_motors(60, -60).unwrap();
        motors.set_motors(0, 0).unwrap();
        assert_eq!(handle.writes(), vec![(60, -60), (0, 0)]);
        assert_eq!(handle.last(), Some((0, 0)));
    }

    #[test]
    fn display_failure_injection() {
        let (mut display, handle) = SimDisplay::new();
        display.set_text("hello").unwrap();
        handle.set_failing(true);
        assert!(display.set_text("world").is_err());
        assert_eq!(handle.texts(), vec!["hello"]);
    }

    #[test]
    fn indicator_counts_writes() {
        let (mut led, handle) = SimIndicator::new();
        led.set_state(true).unwrap();
        assert!(led.state());
        assert!(handle.is_on());
        assert_eq!(handle.write_count(), 1);
    }

    #[test]
    fn from_default_config() {
        let config = RobotConfiguration::default_robot();
        let (hardware, handles) = SimHardware::from_config(&config);
        assert_eq!(hardware.rangers.len(), 3);
        assert!(hardware.line_sensors.is_empty());
        assert!(hardware.motors.is_some());
        assert!(hardware.climate.is_some());
        assert!(hardware.color.is_none());
        assert!(handles.rangers.contains_key("ultrasonic_reverse_left"));
        assert!(handles.climate.is_some());
    }

    #[test]
    fn from_config_wires_line_sensors() {
        let config = RobotConfiguration::default_robot()
            .with_sensor(
                SensorConfiguration::new("ir_left", SensorKind::InfraredReflective, 4)
                    .with_direction(Direction::Left),
            )
            .unwrap()
            .with_sensor(SensorConfiguration::new("rgb", SensorKind::RgbColor, 0).with_i2c_address(0x29))
            .unwrap();
        let (hardware, handles) = SimHardware::from_config(&config);
        assert_eq!(hardware.line_sensors.len(), 1);
        assert_eq!(hardware.line_sensors[0].direction, Direction::Left);
        assert!(handles.line.contains_key("ir_left"));
        assert!(handles.color.is_some());
    }
}
