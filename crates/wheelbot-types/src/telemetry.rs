//! Telemetry records published on the bus.
//!
//! Every record is a flat camelCase JSON object with an ISO-8601
//! `timestamp`. Maps keyed by [`Direction`] use `BTreeMap` so the emitted
//! JSON has a stable key order.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Direction, OperatingState};

/// Published on `<base>/<robot>/state`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateRecord {
    /// Lowercase wire string, e.g. `"emergencystopped"`.
    pub state: String,
    pub display_state: String,
    /// Reason attached to the last transition.
    pub message: String,
    pub state_duration_ms: u64,
    pub timestamp: DateTime<Utc>,
}

impl StateRecord {
    pub fn new(
        state: OperatingState,
        message: impl Into<String>,
        state_duration_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            state: state.wire_str().to_string(),
            display_state: state.display_str().to_string(),
            message: message.into(),
            state_duration_ms,
            timestamp,
        }
    }
}

/// Published on `<base>/<robot>/obstacles`.
///
/// `min_distance` is `null` when no sensor produced a reading in the last
/// scan; directions whose sensors all failed are absent from `directional`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleRecord {
    pub min_distance: Option<u32>,
    pub directional: BTreeMap<Direction, u32>,
    pub timestamp: DateTime<Utc>,
}

/// Line state of one reflective sensor as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineReading {
    Detected,
    Clear,
}

impl From<bool> for LineReading {
    fn from(detected: bool) -> Self {
        if detected {
            LineReading::Detected
        } else {
            LineReading::Clear
        }
    }
}

/// Published on `<base>/<robot>/line`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineRecord {
    pub sensors: BTreeMap<Direction, LineReading>,
    pub timestamp: DateTime<Utc>,
}

/// Published on `<base>/<robot>/color`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColorRecord {
    pub color: String,
    pub timestamp: DateTime<Utc>,
}

/// Published on `<base>/<robot>/temperature` and `<base>/<robot>/humidity`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementRecord {
    pub value: f64,
    /// `"°C"` or `"%"`.
    pub unit: String,
    pub timestamp: DateTime<Utc>,
}

impl MeasurementRecord {
    pub fn celsius(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            unit: "°C".to_string(),
            timestamp,
        }
    }

    pub fn percent(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            value,
            unit: "%".to_string(),
            timestamp,
        }
    }
}

/// Published on `<base>/<robot>/alert`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub active: bool,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Published on `<base>/<robot>/message`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn state_record_uses_camel_case() {
        let rec = StateRecord::new(OperatingState::EmergencyStopped, "button", 1500, ts());
        let json = serde_json::to_value(&rec).unwrap();
        assert_eq!(json["state"], "emergencystopped");
        assert_eq!(json["displayState"], "Emergency Stop");
        assert_eq!(json["stateDurationMs"], 1500);
        assert!(json["timestamp"].as_str().unwrap().starts_with("2024-05-01T12:00:00"));
    }

    #[test]
    fn obstacle_record_null_min_and_snake_case_keys() {
        let mut directional = BTreeMap::new();
        directional.insert(Direction::ReverseLeft, 33);
        let rec = ObstacleRecord {
            min_distance: None,
            directional,
            timestamp: ts(),
        };
        let json = serde_json::to_value(&rec).unwrap();
        assert!(json["minDistance"].is_null());
        assert_eq!(json["directional"]["reverse_left"], 33);
    }

    #[test]
    fn line_record_uses_detected_and_clear() {
        let mut sensors = BTreeMap::new();
        sensors.insert(Direction::Left, LineReading::from(true));
        sensors.insert(Direction::Right, LineReading::from(false));
        let json = serde_json::to_value(&LineRecord {
            sensors,
            timestamp: ts(),
        })
        .unwrap();
        assert_eq!(json["sensors"]["left"], "detected");
        assert_eq!(json["sensors"]["right"], "clear");
    }

    #[test]
    fn measurement_units() {
        assert_eq!(MeasurementRecord::celsius(21.5, ts()).unit, "°C");
        assert_eq!(MeasurementRecord::percent(40.0, ts()).unit, "%");
    }
}
