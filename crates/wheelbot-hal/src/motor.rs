//! Generic `MotorDriver` trait for the differential drive.

use wheelbot_types::WheelbotError;

/// The two drive motors.
///
/// Speeds are in the driver's native signed scale; positive drives forward.
pub trait MotorDriver: Send {
    fn id(&self) -> &str;

    /// Apply `left` and `right` wheel speeds.
    ///
    /// # Errors
    ///
    /// Returns [`WheelbotError::HardwareFault`] if the command cannot be applied.
    fn set_motors(&mut self, left: i16, right: i16) -> Result<(), WheelbotError>;
}
