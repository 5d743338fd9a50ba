//! Normalized operator commands.
//!
//! The wire format (`drive:forward:0.5`, `emergency:stop`, …) is parsed by
//! `wheelbot-middleware::protocol`; everything downstream of the bus only
//! sees these typed values.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Direction of a remote drive command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveDirection {
    Forward,
    Backward,
    Stop,
}

impl FromStr for DriveDirection {
    type Err = String;

    /// Case-insensitive: `"Forward"`, `"BACKWARD"` and `"stop"` all parse.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "forward" => Ok(DriveDirection::Forward),
            "backward" => Ok(DriveDirection::Backward),
            "stop" => Ok(DriveDirection::Stop),
            other => Err(format!("unknown drive direction '{other}'")),
        }
    }
}

/// A command received from the remote operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Command {
    /// Set the target speed. `speed` is a fraction of the configured maximum.
    Drive { direction: DriveDirection, speed: f64 },
    /// Set (`true`) or release (`false`) the emergency latch.
    Emergency { stop: bool },
    /// Raise an operator alert; an empty message clears it.
    Alert { message: String },
    /// Show an informational message on the display.
    Message { text: String },
}

impl Command {
    /// Short label used in logs and acknowledgements.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Drive { .. } => "drive",
            Command::Emergency { .. } => "emergency",
            Command::Alert { .. } => "alert",
            Command::Message { .. } => "message",
        }
    }
}
