//! Static robot configuration.
//!
//! A [`RobotConfiguration`] is loaded once at startup (see `wheelbot-cli`)
//! and shared read-only with every subsystem. All tunables carry serde
//! defaults so a config file only needs to list what differs from the
//! stock robot.

use serde::{Deserialize, Serialize};

use crate::{Direction, WheelbotError};

// ────────────────────────────────────────────────────────────────────────────
// Sensors
// ────────────────────────────────────────────────────────────────────────────

/// Kind of hardware attached to the robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Ultrasonic ranger with separate trigger and echo pins.
    #[serde(rename = "ultrasonic_2pin")]
    Ultrasonic2Pin,
    /// Ultrasonic ranger sharing one pin for trigger and echo.
    #[serde(rename = "ultrasonic_1pin")]
    Ultrasonic1Pin,
    /// Analog infrared reflective sensor used for line detection.
    InfraredReflective,
    /// Temperature and humidity sensor.
    Dht11,
    /// I2C RGB color sensor.
    RgbColor,
    Button,
    Led,
}

impl SensorKind {
    /// `true` for the ultrasonic ranging kinds.
    pub fn is_ranging(self) -> bool {
        matches!(self, SensorKind::Ultrasonic2Pin | SensorKind::Ultrasonic1Pin)
    }
}

/// Configuration of a single sensor or output device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorConfiguration {
    /// Unique identifier, e.g. `"ultrasonic_forward"`.
    pub id: String,
    pub kind: SensorKind,
    /// Primary (or only) pin.
    pub pin: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary_pin: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i2c_address: Option<u8>,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl SensorConfiguration {
    pub fn new(id: impl Into<String>, kind: SensorKind, pin: u8) -> Self {
        Self {
            id: id.into(),
            kind,
            pin,
            secondary_pin: None,
            direction: None,
            i2c_address: None,
            enabled: true,
        }
    }

    pub fn with_secondary_pin(mut self, pin: u8) -> Self {
        self.secondary_pin = Some(pin);
        self
    }

    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn with_i2c_address(mut self, address: u8) -> Self {
        self.i2c_address = Some(address);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tuning sections
// ────────────────────────────────────────────────────────────────────────────

/// Drive and steering tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriveConfiguration {
    /// Maximum absolute speed (fraction of full motor power).
    pub max_speed: f64,
    /// Per-tick geometric growth factor of the steering offset.
    pub sensitivity: f64,
    /// Upper bound on the steering offset.
    pub max_turning: f64,
    /// Steering offset on the first turning tick.
    pub starting_turn: f64,
    /// Ramp step applied to the actual speed each tick.
    pub speed_step: f64,
    /// Multiplier converting a speed into the motor driver's native scale.
    pub motor_scale: f64,
    /// Flip the sign of the differential steering offset.
    pub invert_steering: bool,
}

impl Default for DriveConfiguration {
    fn default() -> Self {
        Self {
            max_speed: 0.2,
            sensitivity: 1.0,
            max_turning: 0.2,
            starting_turn: 0.2,
            speed_step: 0.05,
            motor_scale: 300.0,
            invert_steering: false,
        }
    }
}

/// Message bus tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunicationConfiguration {
    /// Prefix of every topic: `<base_topic>/<robot_name>/<metric>`.
    pub base_topic: String,
    /// Minimum spacing of sensor telemetry (obstacles, line, color, climate).
    pub data_publish_interval_ms: u64,
    /// Minimum spacing of state, alert and message publications.
    pub status_publish_interval_ms: u64,
    /// Listen address of the WebSocket bridge.
    pub bridge_addr: String,
}

impl Default for CommunicationConfiguration {
    fn default() -> Self {
        Self {
            base_topic: "avansict".to_string(),
            data_publish_interval_ms: 300,
            status_publish_interval_ms: 1000,
            bridge_addr: "0.0.0.0:9090".to_string(),
        }
    }
}

/// One speed band: below `below_cm` the target speed is capped at `max_speed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedBand {
    pub below_cm: u32,
    pub max_speed: f64,
}

/// Obstacle arbitration tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstaclePolicyConfiguration {
    /// Interval between ultrasonic scans.
    pub scan_interval_ms: u64,
    /// Stop when the nearest obstacle is closer than this.
    pub stop_distance_cm: u32,
    /// Resume once the nearest obstacle is at least this far away.
    pub clear_distance_cm: u32,
    /// Speed caps by distance, checked nearest first.
    pub speed_bands: Vec<SpeedBand>,
}

impl Default for ObstaclePolicyConfiguration {
    fn default() -> Self {
        Self {
            scan_interval_ms: 200,
            stop_distance_cm: 20,
            clear_distance_cm: 22,
            speed_bands: vec![SpeedBand {
                below_cm: 15,
                max_speed: 0.15,
            }],
        }
    }
}

/// Line sensor tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfiguration {
    pub scan_interval_ms: u64,
    /// Raw analog value above which a line is reported.
    pub threshold: u16,
    /// Minimum time between two analog samples of the same sensor.
    pub settle_ms: u64,
}

impl Default for LineConfiguration {
    fn default() -> Self {
        Self {
            scan_interval_ms: 10,
            threshold: 900,
            settle_ms: 50,
        }
    }
}

/// Temperature/humidity and color sampling tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfiguration {
    /// Minimum spacing between two climate sensor reads.
    pub climate_min_interval_ms: u64,
    pub color_scan_interval_ms: u64,
}

impl Default for EnvironmentConfiguration {
    fn default() -> Self {
        Self {
            climate_min_interval_ms: 1500,
            color_scan_interval_ms: 100,
        }
    }
}

/// Control loop pacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoopConfiguration {
    /// Sleep between two ticks.
    pub tick_spacing_ms: u64,
}

impl Default for LoopConfiguration {
    fn default() -> Self {
        Self { tick_spacing_ms: 1 }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// RobotConfiguration
// ────────────────────────────────────────────────────────────────────────────

/// Immutable description of the robot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobotConfiguration {
    /// Robot name used in topics and on the display.
    #[serde(default = "default_robot_name")]
    pub robot_name: String,
    #[serde(default = "default_alert_led_pin")]
    pub alert_led_pin: u8,
    #[serde(default = "default_emergency_stop_button_pin")]
    pub emergency_stop_button_pin: u8,
    #[serde(default = "default_lcd_i2c_address")]
    pub lcd_i2c_address: u8,
    #[serde(default)]
    sensors: Vec<SensorConfiguration>,
    #[serde(default)]
    pub drive: DriveConfiguration,
    #[serde(default)]
    pub communication: CommunicationConfiguration,
    #[serde(default)]
    pub obstacle: ObstaclePolicyConfiguration,
    #[serde(default)]
    pub line: LineConfiguration,
    #[serde(default)]
    pub environment: EnvironmentConfiguration,
    #[serde(default, rename = "loop")]
    pub control_loop: LoopConfiguration,
}

impl RobotConfiguration {
    /// An empty configuration with default tuning and no sensors.
    pub fn new(robot_name: impl Into<String>) -> Self {
        Self {
            robot_name: robot_name.into(),
            alert_led_pin: default_alert_led_pin(),
            emergency_stop_button_pin: default_emergency_stop_button_pin(),
            lcd_i2c_address: default_lcd_i2c_address(),
            sensors: Vec::new(),
            drive: DriveConfiguration::default(),
            communication: CommunicationConfiguration::default(),
            obstacle: ObstaclePolicyConfiguration::default(),
            line: LineConfiguration::default(),
            environment: EnvironmentConfiguration::default(),
            control_loop: LoopConfiguration::default(),
        }
    }

    /// The stock robot: three ultrasonic rangers and a DHT11.
    pub fn default_robot() -> Self {
        let mut config = Self::new("John");
        let sensors = [
            SensorConfiguration::new("ultrasonic_forward", SensorKind::Ultrasonic1Pin, 5)
                .with_secondary_pin(6)
                .with_direction(Direction::Forward),
            SensorConfiguration::new("ultrasonic_reverse_left", SensorKind::Ultrasonic1Pin, 18)
                .with_secondary_pin(14)
                .with_direction(Direction::ReverseLeft),
            SensorConfiguration::new("ultrasonic_reverse_right", SensorKind::Ultrasonic1Pin, 16)
                .with_secondary_pin(20)
                .with_direction(Direction::ReverseRight),
            SensorConfiguration::new("dht11", SensorKind::Dht11, 26),
        ];
        for sensor in sensors {
            // Ids above are distinct.
            config.sensors.push(sensor);
        }
        config
    }

    /// Append a sensor.
    ///
    /// # Errors
    ///
    /// Returns [`WheelbotError::DuplicateSensor`] when a sensor with the same
    /// id is already configured.
    pub fn add_sensor(&mut self, sensor: SensorConfiguration) -> Result<(), WheelbotError> {
        if self.sensor(&sensor.id).is_some() {
            return Err(WheelbotError::DuplicateSensor(sensor.id));
        }
        self.sensors.push(sensor);
        Ok(())
    }

    /// Builder-style variant of [`add_sensor`][Self::add_sensor].
    pub fn with_sensor(mut self, sensor: SensorConfiguration) -> Result<Self, WheelbotError> {
        self.add_sensor(sensor)?;
        Ok(self)
    }

    /// All sensors in configuration order.
    pub fn sensors(&self) -> &[SensorConfiguration] {
        &self.sensors
    }

    pub fn sensor(&self, id: &str) -> Option<&SensorConfiguration> {
        self.sensors.iter().find(|s| s.id == id)
    }

    /// Enabled ultrasonic rangers.
    pub fn ranging_sensors(&self) -> impl Iterator<Item = &SensorConfiguration> {
        self.sensors
            .iter()
            .filter(|s| s.enabled && s.kind.is_ranging())
    }

    pub fn ranging_sensors_facing(
        &self,
        direction: Direction,
    ) -> impl Iterator<Item = &SensorConfiguration> {
        self.ranging_sensors()
            .filter(move |s| s.direction == Some(direction))
    }

    /// Enabled reflective line sensors.
    pub fn line_sensors(&self) -> impl Iterator<Item = &SensorConfiguration> {
        self.sensors
            .iter()
            .filter(|s| s.enabled && s.kind == SensorKind::InfraredReflective)
    }

    /// First enabled sensor of `kind`, if any.
    pub fn first_of_kind(&self, kind: SensorKind) -> Option<&SensorConfiguration> {
        self.sensors.iter().find(|s| s.enabled && s.kind == kind)
    }

    /// Check the invariants that deserialization alone cannot enforce.
    ///
    /// # Errors
    ///
    /// * [`WheelbotError::DuplicateSensor`] – two sensors share an id.
    /// * [`WheelbotError::MissingSensor`] – no enabled ultrasonic ranger.
    /// * [`WheelbotError::InvalidConfig`] – inconsistent tuning values.
    pub fn validate(&self) -> Result<(), WheelbotError> {
        let mut seen = std::collections::HashSet::new();
        for sensor in &self.sensors {
            if !seen.insert(sensor.id.as_str()) {
                return Err(WheelbotError::DuplicateSensor(sensor.id.clone()));
            }
            if sensor.kind.is_ranging() && sensor.enabled && sensor.direction.is_none() {
                return Err(WheelbotError::InvalidConfig(format!(
                    "ranging sensor '{}' has no direction",
                    sensor.id
                )));
            }
        }
        if self.ranging_sensors().next().is_none() {
            return Err(WheelbotError::MissingSensor(
                "at least one enabled ultrasonic sensor is required".to_string(),
            ));
        }
        if self.robot_name.trim().is_empty() || self.robot_name.contains('/') {
            return Err(WheelbotError::InvalidConfig(format!(
                "robot_name '{}' must be non-empty and contain no '/'",
                self.robot_name
            )));
        }
        if self.drive.max_speed <= 0.0 || self.drive.speed_step <= 0.0 {
            return Err(WheelbotError::InvalidConfig(
                "drive.max_speed and drive.speed_step must be positive".to_string(),
            ));
        }
        if self.obstacle.clear_distance_cm <= self.obstacle.stop_distance_cm {
            return Err(WheelbotError::InvalidConfig(format!(
                "obstacle.clear_distance_cm ({}) must exceed stop_distance_cm ({})",
                self.obstacle.clear_distance_cm, self.obstacle.stop_distance_cm
            )));
        }
        if self.communication.data_publish_interval_ms == 0
            || self.communication.status_publish_interval_ms == 0
        {
            return Err(WheelbotError::InvalidConfig(
                "publish intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RobotConfiguration {
    fn default() -> Self {
        Self::default_robot()
    }
}

fn default_true() -> bool {
    true
}

fn default_robot_name() -> String {
    "John".to_string()
}

fn default_alert_led_pin() -> u8 {
    22
}

fn default_emergency_stop_button_pin() -> u8 {
    23
}

fn default_lcd_i2c_address() -> u8 {
    0x3E
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_robot_is_valid() {
        let cfg = RobotConfiguration::default_robot();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.robot_name, "John");
        assert_eq!(cfg.ranging_sensors().count(), 3);
        assert_eq!(cfg.alert_led_pin, 22);
        assert_eq!(cfg.lcd_i2c_address, 0x3E);
    }

    #[test]
    fn add_sensor_rejects_duplicate_id() {
        let mut cfg = RobotConfiguration::default_robot();
        let dup = SensorConfiguration::new("dht11", SensorKind::Dht11, 4);
        assert_eq!(
            cfg.add_sensor(dup),
            Err(WheelbotError::DuplicateSensor("dht11".to_string()))
        );
        assert_eq!(cfg.sensors().len(), 4);
    }

    #[test]
    fn ranging_sensors_by_direction() {
        let cfg = RobotConfiguration::default_robot();
        let forward: Vec<_> = cfg.ranging_sensors_facing(Direction::Forward).collect();
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].id, "ultrasonic_forward");
        assert_eq!(cfg.ranging_sensors_facing(Direction::Left).count(), 0);
    }

    #[test]
    fn disabled_sensors_are_not_listed() {
        let cfg = RobotConfiguration::new("r")
            .with_sensor(
                SensorConfiguration::new("us", SensorKind::Ultrasonic2Pin, 5)
                    .with_direction(Direction::Forward)
                    .disabled(),
            )
            .unwrap();
        assert_eq!(cfg.ranging_sensors().count(), 0);
        assert!(matches!(cfg.validate(), Err(WheelbotError::MissingSensor(_))));
    }

    #[test]
    fn validate_rejects_inverted_hysteresis() {
        let mut cfg = RobotConfiguration::default_robot();
        cfg.obstacle.clear_distance_cm = 10;
        assert!(matches!(cfg.validate(), Err(WheelbotError::InvalidConfig(_))));
    }

    #[test]
    fn validate_rejects_ranger_without_direction() {
        let cfg = RobotConfiguration::new("r")
            .with_sensor(SensorConfiguration::new("us", SensorKind::Ultrasonic2Pin, 5))
            .unwrap();
        assert!(matches!(cfg.validate(), Err(WheelbotError::InvalidConfig(_))));
    }

    #[test]
    fn validate_catches_duplicates_from_deserialized_input() {
        let raw = r#"
            robot_name = "Dup"
            alert_led_pin = 22
            emergency_stop_button_pin = 23
            lcd_i2c_address = 62

            [[sensors]]
            id = "us"
            kind = "ultrasonic_2pin"
            pin = 5
            direction = "forward"

            [[sensors]]
            id = "us"
            kind = "ultrasonic_2pin"
            pin = 7
            direction = "left"
        "#;
        let cfg: RobotConfiguration = toml::from_str(raw).unwrap();
        assert_eq!(cfg.validate(), Err(WheelbotError::DuplicateSensor("us".into())));
    }

    #[test]
    fn toml_roundtrip_keeps_defaults() {
        let cfg = RobotConfiguration::default_robot();
        let raw = toml::to_string_pretty(&cfg).unwrap();
        let back: RobotConfiguration = toml::from_str(&raw).unwrap();
        assert_eq!(back, cfg);
        assert_eq!(back.obstacle.stop_distance_cm, 20);
        assert_eq!(back.communication.base_topic, "avansict");
    }

    #[test]
    fn minimal_toml_fills_tuning_defaults() {
        let raw = r#"
            alert_led_pin = 22
            emergency_stop_button_pin = 23
            lcd_i2c_address = 62

            [[sensors]]
            id = "front"
            kind = "ultrasonic_1pin"
            pin = 5
            direction = "forward"
        "#;
        let cfg: RobotConfiguration = toml::from_str(raw).unwrap();
        assert_eq!(cfg.robot_name, "John");
        assert!((cfg.drive.speed_step - 0.05).abs() < f64::EPSILON);
        assert_eq!(cfg.line.threshold, 900);
        assert_eq!(cfg.control_loop.tick_spacing_ms, 1);
        assert!(cfg.sensors()[0].enabled);
        assert!(cfg.validate().is_ok());
    }
}
