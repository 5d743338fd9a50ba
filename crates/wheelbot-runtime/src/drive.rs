//! [`DriveController`] – speed ramp and line-following steering.
//!
//! The controller is the only writer to the motors. Each [`update`] moves
//! the actual speed one `speed_step` toward the target, then adds the
//! steering offset for the current [`Steering`] mode and writes both wheel
//! speeds in the driver's native scale.
//!
//! Steering follows the line sensors: only the left sensor on the line
//! turns left, only the right sensor turns right, anything else drives
//! straight. While a turn persists the offset grows geometrically from
//! `starting_turn` by `sensitivity` per tick, capped at `max_turning`.
//!
//! The `enabled` flag belongs to the orchestrator. While it is `false`
//! nothing is written to the motors at all and turns do not build up, so a
//! resumed drive starts any turn from `starting_turn` again.
//!
//! [`update`]: DriveController::update

use tracing::debug;
use wheelbot_hal::MotorDriver;
use wheelbot_perception::{LineListener, LineState};
use wheelbot_types::WheelbotError;
use wheelbot_types::config::DriveConfiguration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Steering {
    Forward,
    TurnLeft,
    TurnRight,
}

impl Steering {
    /// Steering mode for a line reading.
    pub fn from_line(state: LineState) -> Self {
        match (state.left, state.right) {
            (true, false) => Steering::TurnLeft,
            (false, true) => Steering::TurnRight,
            _ => Steering::Forward,
        }
    }
}

pub struct DriveController {
    motors: Option<Box<dyn MotorDriver>>,
    tuning: DriveConfiguration,
    target: f64,
    actual: f64,
    steering: Steering,
    turn_ticks: u32,
    enabled: bool,
}

impl DriveController {
    pub fn new(motors: Option<Box<dyn MotorDriver>>, tuning: DriveConfiguration) -> Self {
        Self {
            motors,
            tuning,
            target: 0.0,
            actual: 0.0,
            steering: Steering::Forward,
            turn_ticks: 0,
            enabled: true,
        }
    }

    /// Set the target speed, clamped to `±max_speed`.
    pub fn set_target(&mut self, speed: f64) {
        let max = self.tuning.max_speed;
        self.target = speed.clamp(-max, max);
    }

    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn actual(&self) -> f64 {
        self.actual
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        if enabled != self.enabled {
            debug!(enabled, "drive enable changed");
        }
        if !enabled {
            self.turn_ticks = 0;
        }
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn steering(&self) -> Steering {
        self.steering
    }

    /// Update the steering mode from a line reading.
    pub fn line_input(&mut self, state: LineState) {
        let steering = Steering::from_line(state);
        if steering != self.steering {
            debug!(?steering, "steering changed");
            self.steering = steering;
            self.turn_ticks = 0;
        }
    }

    /// Current steering offset. Zero when driving straight.
    pub fn steer_offset(&self) -> f64 {
        if self.steering == Steering::Forward || self.turn_ticks == 0 {
            return 0.0;
        }
        let exponent = i32::try_from(self.turn_ticks - 1).unwrap_or(i32::MAX);
        (self.tuning.starting_turn * self.tuning.sensitivity.powi(exponent))
            .min(self.tuning.max_turning)
    }

    /// Advance the ramp and steering by one tick and write the motors.
    pub fn update(&mut self) -> Result<(), WheelbotError> {
        let step = self.tuning.speed_step;
        if self.actual < self.target {
            self.actual = (self.actual + step).min(self.target);
        } else if self.actual > self.target {
            self.actual = (self.actual - step).max(self.target);
        }

        match self.steering {
            Steering::Forward => self.turn_ticks = 0,
            Steering::TurnLeft | Steering::TurnRight if self.enabled => {
                self.turn_ticks = self.turn_ticks.saturating_add(1);
            }
            Steering::TurnLeft | Steering::TurnRight => {}
        }

        let (left, right) = self.wheel_speeds();
        self.write(left, right)
    }

    /// Zero target and actual speed and write zero immediately.
    pub fn emergency_stop(&mut self) -> Result<(), WheelbotError> {
        self.target = 0.0;
        self.actual = 0.0;
        self.write(0.0, 0.0)
    }

    /// Left and right wheel speeds before native conversion.
    pub fn wheel_speeds(&self) -> (f64, f64) {
        let mut offset = self.steer_offset();
        if self.tuning.invert_steering {
            offset = -offset;
        }
        match self.steering {
            Steering::Forward => (self.actual, self.actual),
            Steering::TurnLeft => (self.actual - offset, self.actual + offset),
            Steering::TurnRight => (self.actual + offset, self.actual - offset),
        }
    }

    /// Clamp to `±max_speed` and convert to the driver's native scale.
    pub fn to_native(&self, speed: f64) -> i16 {
        let max = self.tuning.max_speed;
        let scaled = (speed.clamp(-max, max) * self.tuning.motor_scale).round();
        scaled.clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
    }

    fn write(&mut self, left: f64, right: f64) -> Result<(), WheelbotError> {
        if !self.enabled {
            return Ok(());
        }
        let (left, right) = (self.to_native(left), self.to_native(right));
        match self.motors.as_mut() {
            Some(motors) => motors.set_motors(left, right),
            None => Ok(()),
        }
    }
}

impl LineListener for DriveController {
    fn on_line(&mut self, state: LineState) {
        self.line_input(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wheelbot_hal::sim::{SimMotorHandle, SimMotors};

    fn drive(tuning: DriveConfiguration) -> (DriveController, SimMotorHandle) {
        let (motors, handle) = SimMotors::new();
        (DriveController::new(Some(motors), tuning), handle)
    }

    const LEFT_ONLY: LineState = LineState {
        left: true,
        forward: false,
        right: false,
    };

    #[test]
    fn ramp_reaches_target_in_four_ticks_without_overshoot() {
        let (mut d, motors) = drive(DriveConfiguration::default());
        d.set_target(0.2);

        for _ in 0..3 {
            d.update().unwrap();
            assert!(d.actual() < 0.2);
        }
        d.update().unwrap();
        assert_eq!(d.actual(), 0.2);
        d.update().unwrap();
        assert_eq!(d.actual(), 0.2);
        assert_eq!(motors.last(), Some((60, 60)));
    }

    #[test]
    fn ramp_down_clamps_at_target() {
        let (mut d, _) = drive(DriveConfiguration::default());
        d.set_target(0.2);
        for _ in 0..4 {
            d.update().unwrap();
        }
        d.set_target(-0.02);
        d.update().unwrap();
        d.update().unwrap();
        d.update().unwrap();
        d.update().unwrap();
        d.update().unwrap();
        assert_eq!(d.actual(), -0.02);
    }

    #[test]
    fn target_is_clamped_to_max() {
        let (mut d, _) = drive(DriveConfiguration::default());
        d.set_target(5.0);
        assert_eq!(d.target(), 0.2);
        d.set_target(-5.0);
        assert_eq!(d.target(), -0.2);
    }

    #[test]
    fn steering_modes_from_line() {
        let s = |left, forward, right| {
            Steering::from_line(LineState {
                left,
                forward,
                right,
            })
        };
        assert_eq!(s(true, false, false), Steering::TurnLeft);
        assert_eq!(s(false, true, true), Steering::TurnRight);
        assert_eq!(s(true, true, true), Steering::Forward);
        assert_eq!(s(false, false, false), Steering::Forward);
    }

    #[test]
    fn turn_left_applies_differential_offset() {
        let tuning = DriveConfiguration {
            max_speed: 0.5,
            starting_turn: 0.1,
            ..DriveConfiguration::default()
        };
        let (mut d, motors) = drive(tuning);
        d.set_target(0.2);
        for _ in 0..4 {
            d.update().unwrap();
        }
        d.line_input(LEFT_ONLY);
        d.update().unwrap();
        assert!((d.steer_offset() - 0.1).abs() < 1e-9);
        // left 0.1 → 30, right 0.3 → 90
        assert_eq!(motors.last(), Some((30, 90)));
    }

    #[test]
    fn invert_flips_polarity() {
        let tuning = DriveConfiguration {
            max_speed: 0.5,
            starting_turn: 0.1,
            invert_steering: true,
            ..DriveConfiguration::default()
        };
        let (mut d, motors) = drive(tuning);
        d.set_target(0.2);
        for _ in 0..4 {
            d.update().unwrap();
        }
        d.line_input(LEFT_ONLY);
        d.update().unwrap();
        assert_eq!(motors.last(), Some((90, 30)));
    }

    #[test]
    fn offset_grows_geometrically_and_caps() {
        let tuning = DriveConfiguration {
            max_speed: 1.0,
            starting_turn: 0.1,
            sensitivity: 2.0,
            max_turning: 0.35,
            ..DriveConfiguration::default()
        };
        let (mut d, _) = drive(tuning);
        d.line_input(LineState {
            left: false,
            forward: false,
            right: true,
        });
        let mut offsets = Vec::new();
        for _ in 0..4 {
            d.update().unwrap();
            offsets.push(d.steer_offset());
        }
        let expected = [0.1, 0.2, 0.35, 0.35];
        for (got, want) in offsets.iter().zip(expected) {
            assert!((got - want).abs() < 1e-9, "got {got}, want {want}");
        }

        d.line_input(LineState::default());
        d.update().unwrap();
        assert_eq!(d.steer_offset(), 0.0);
    }

    #[test]
    fn wheel_speeds_are_clamped_before_conversion() {
        let (mut d, motors) = drive(DriveConfiguration::default());
        d.set_target(0.2);
        for _ in 0..4 {
            d.update().unwrap();
        }
        d.line_input(LEFT_ONLY);
        d.update().unwrap();
        // left 0.0 → 0, right 0.4 clamped to 0.2 → 60
        assert_eq!(motors.last(), Some((0, 60)));
    }

    #[test]
    fn emergency_stop_bypasses_ramp() {
        let (mut d, motors) = drive(DriveConfiguration::default());
        d.set_target(0.2);
        for _ in 0..4 {
            d.update().unwrap();
        }
        d.emergency_stop().unwrap();
        assert_eq!(d.actual(), 0.0);
        assert_eq!(d.target(), 0.0);
        assert_eq!(motors.last(), Some((0, 0)));
    }

    #[test]
    fn disabled_drive_writes_nothing() {
        let (mut d, motors) = drive(DriveConfiguration::default());
        d.set_enabled(false);
        d.set_target(0.2);
        d.update().unwrap();
        d.emergency_stop().unwrap();
        assert_eq!(motors.write_count(), 0);
    }

    #[test]
    fn turn_restarts_after_drive_is_reenabled() {
        let tuning = DriveConfiguration {
            max_speed: 1.0,
            starting_turn: 0.1,
            sensitivity: 2.0,
            max_turning: 0.35,
            ..DriveConfiguration::default()
        };
        let (mut d, _) = drive(tuning);
        d.line_input(LEFT_ONLY);
        for _ in 0..3 {
            d.update().unwrap();
        }
        assert!((d.steer_offset() - 0.35).abs() < 1e-9);

        d.set_enabled(false);
        for _ in 0..10 {
            d.update().unwrap();
        }
        assert_eq!(d.steer_offset(), 0.0);

        d.set_enabled(true);
        d.update().unwrap();
        assert_eq!(d.steering(), Steering::TurnLeft);
        assert!((d.steer_offset() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn listener_forwards_line_state() {
        let (mut d, _) = drive(DriveConfiguration::default());
        let listener: &mut dyn LineListener = &mut d;
        listener.on_line(LEFT_ONLY);
        assert_eq!(d.steering(), Steering::TurnLeft);
    }
}
