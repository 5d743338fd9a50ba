//! Generic `RangeSensor` trait for ultrasonic distance sensors.

use wheelbot_types::WheelbotError;

/// A distance sensor returning whole centimetres.
///
/// Implementations must bound every read: a missing echo is reported as
/// [`WheelbotError::SensorTimeout`], never by blocking the control thread.
pub trait RangeSensor: Send {
    /// Stable identifier, e.g. `"ultrasonic_forward"`.
    fn id(&self) -> &str;

    /// Measure the distance to the nearest obstacle.
    ///
    /// # Errors
    ///
    /// Returns [`WheelbotError::SensorTimeout`] when no echo arrived in time
    /// and [`WheelbotError::SensorFault`] for any other driver failure.
    fn read_distance_cm(&mut self) -> Result<u32, WheelbotError>;
}
