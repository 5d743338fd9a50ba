//! `wheelbot-types` – shared vocabulary of the Wheelbot stack.
//!
//! Every other crate speaks in these types: the operating states, the eight
//! compass-relative sensor facings, the parsed operator [`Command`], the
//! telemetry records published on the bus, the static
//! [`RobotConfiguration`][config::RobotConfiguration] and the global
//! [`WheelbotError`].

pub mod command;
pub mod config;
pub mod telemetry;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use command::{Command, DriveDirection};
pub use config::{RobotConfiguration, SensorConfiguration, SensorKind};

/// Operating state of the robot as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperatingState {
    /// Process started, subsystems being constructed.
    Initializing,
    /// Ready but stationary.
    Ready,
    /// Actively driving.
    Operating,
    /// Stopped because of an obstacle.
    Stopped,
    /// Emergency latch is set.
    EmergencyStopped,
    /// A tick or startup step failed.
    Fault,
    /// Shut down.
    Offline,
}

impl OperatingState {
    /// Stable lowercase wire string, e.g. `"emergencystopped"`.
    pub fn wire_str(self) -> &'static str {
        match self {
            OperatingState::Initializing => "initializing",
            OperatingState::Ready => "ready",
            OperatingState::Operating => "operating",
            OperatingState::Stopped => "stopped",
            OperatingState::EmergencyStopped => "emergencystopped",
            OperatingState::Fault => "fault",
            OperatingState::Offline => "offline",
        }
    }

    /// Human-readable label used on the display and dashboards.
    pub fn display_str(self) -> &'static str {
        match self {
            OperatingState::Initializing => "Initializing",
            OperatingState::Ready => "Ready",
            OperatingState::Operating => "Operating",
            OperatingState::Stopped => "Stopped",
            OperatingState::EmergencyStopped => "Emergency Stop",
            OperatingState::Fault => "Fault",
            OperatingState::Offline => "Offline",
        }
    }
}

impl std::fmt::Display for OperatingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_str())
    }
}

/// Direction a sensor faces, relative to the robot's forward axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    ReverseLeft,
    ReverseRight,
}

impl Direction {
    /// All eight facings in declaration order.
    pub const ALL: [Direction; 8] = [
        Direction::Forward,
        Direction::Reverse,
        Direction::Left,
        Direction::Right,
        Direction::ForwardLeft,
        Direction::ForwardRight,
        Direction::ReverseLeft,
        Direction::ReverseRight,
    ];

    /// The snake_case key used in telemetry maps.
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Forward => "forward",
            Direction::Reverse => "reverse",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::ForwardLeft => "forward_left",
            Direction::ForwardRight => "forward_right",
            Direction::ReverseLeft => "reverse_left",
            Direction::ReverseRight => "reverse_right",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Global error type spanning configuration, hardware and bus failures.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WheelbotError {
    #[error("Duplicate sensor id: {0}")]
    DuplicateSensor(String),

    #[error("Missing sensor: {0}")]
    MissingSensor(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sensor {sensor} timed out")]
    SensorTimeout { sensor: String },

    #[error("Sensor fault on {sensor}: {details}")]
    SensorFault { sensor: String, details: String },

    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl WheelbotError {
    /// `true` for configuration errors, which are only raised at startup.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            WheelbotError::DuplicateSensor(_)
                | WheelbotError::MissingSensor(_)
                | WheelbotError::InvalidConfig(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_strings_are_lowercase_variant_names() {
        assert_eq!(OperatingState::EmergencyStopped.wire_str(), "emergencystopped");
        assert_eq!(OperatingState::Operating.to_string(), "operating");
        assert_eq!(OperatingState::EmergencyStopped.display_str(), "Emergency Stop");
    }

    #[test]
    fn direction_serializes_as_snake_case() {
        let json = serde_json::to_string(&Direction::ReverseLeft).unwrap();
        assert_eq!(json, "\"reverse_left\"");
        let back: Direction = serde_json::from_str("\"forward_right\"").unwrap();
        assert_eq!(back, Direction::ForwardRight);
        for d in Direction::ALL {
            assert_eq!(serde_json::to_string(&d).unwrap(), format!("\"{}\"", d.as_str()));
        }
    }

    #[test]
    fn error_display_and_classification() {
        let err = WheelbotError::DuplicateSensor("ultrasonic_forward".into());
        assert!(err.to_string().contains("ultrasonic_forward"));
        assert!(err.is_config());

        let err = WheelbotError::SensorTimeout {
            sensor: "ultrasonic_left".into(),
        };
        assert!(err.to_string().contains("timed out"));
        assert!(!err.is_config());
    }
}
