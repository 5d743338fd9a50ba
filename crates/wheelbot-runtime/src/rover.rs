//! [`Rover`] – the orchestrator.
//!
//! A `Rover` owns one of every subsystem and runs them in a fixed order on
//! each [`tick`][Rover::tick]:
//!
//! 1. **Commands** – drain the command topic and apply each command.
//! 2. **Sense** – obstacle scan, line scan (feeding steering), button poll,
//!    climate and color sampling.
//! 3. **Arbitrate** – obstacle stop/clear hysteresis under the emergency
//!    latch, then the effective target speed from the drive intent and the
//!    distance speed band.
//! 4. **Act** – advance the drive ramp and write the motors.
//! 5. **Report** – rate-limited telemetry on every stream.
//!
//! The emergency latch always wins. While it is set the drive is stopped
//! and disabled and drive commands are rejected. Releasing it resumes
//! operation unless an obstacle stop is still in force, in which case the
//! robot stays `Stopped` until the obstacle clears.
//!
//! Any error raised inside a tick moves the robot to
//! [`OperatingState::Fault`]; the next tick runs normally.

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};
use wheelbot_hal::HardwareSet;
use wheelbot_kernel::{GuardEvent, LatchChange, ObstacleGuard, SafetyPanel, StateListener, StateMachine};
use wheelbot_middleware::Communication;
use wheelbot_perception::{ClimateMonitor, ColorMonitor, LineDetector, ObstacleDetector};
use wheelbot_types::telemetry::{AlertRecord, ColorRecord, MeasurementRecord, MessageRecord};
use wheelbot_types::{Command, DriveDirection, OperatingState, RobotConfiguration, WheelbotError};

use crate::drive::DriveController;

/// The operator's requested speed, kept across stops so driving resumes
/// once the robot is allowed to move again.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DriveIntent {
    /// Signed speed, already scaled to `±max_speed`.
    pub speed: f64,
    /// `false` after a `stop` command.
    pub active: bool,
}

pub struct Rover {
    robot_name: String,
    max_speed: f64,
    state: StateMachine,
    obstacles: ObstacleDetector,
    line: LineDetector,
    safety: SafetyPanel,
    drive: DriveController,
    climate: ClimateMonitor,
    color: ColorMonitor,
    guard: ObstacleGuard,
    comms: Communication,
    intent: DriveIntent,
    ticks: u64,
}

impl Rover {
    /// Wire every subsystem from `config` and `hardware`.
    pub fn new(config: &RobotConfiguration, hardware: HardwareSet, comms: Communication) -> Self {
        let HardwareSet {
            rangers,
            line_sensors,
            motors,
            display,
            button,
            indicator,
            climate,
            color,
        } = hardware;

        Self {
            robot_name: config.robot_name.clone(),
            max_speed: config.drive.max_speed,
            state: StateMachine::new(),
            obstacles: ObstacleDetector::new(
                rangers,
                Duration::from_millis(config.obstacle.scan_interval_ms),
            ),
            line: LineDetector::new(
                line_sensors,
                Duration::from_millis(config.line.scan_interval_ms),
            ),
            safety: SafetyPanel::new(indicator, display, button),
            drive: DriveController::new(motors, config.drive.clone()),
            climate: ClimateMonitor::new(
                climate,
                Duration::from_millis(config.communication.data_publish_interval_ms),
                Duration::from_millis(config.environment.climate_min_interval_ms),
            ),
            color: ColorMonitor::new(
                color,
                Duration::from_millis(config.environment.color_scan_interval_ms),
            ),
            guard: ObstacleGuard::new(&config.obstacle),
            comms,
            intent: DriveIntent::default(),
            ticks: 0,
        }
    }

    pub fn add_state_listener(&mut self, listener: Box<dyn StateListener>) {
        self.state.add_listener(listener);
    }

    // ── Lifecycle ───────────────────────────────────────────────────────────

    /// Prime the panel and show the greeting. Ends in `Ready`, or in `Fault`
    /// when the panel hardware fails.
    pub fn start(&mut self) -> OperatingState {
        let result = self
            .safety
            .init()
            .and_then(|()| self.safety.display_message(&self.robot_name));
        match result {
            Ok(()) => {
                info!(robot = %self.robot_name, "rover started");
                self.state.set_state(OperatingState::Ready, "Robot ready");
            }
            Err(e) => {
                error!(error = %e, "rover startup failed");
                self.state
                    .set_state(OperatingState::Fault, format!("Init failed: {e}"));
            }
        }
        self.state.current()
    }

    /// Run one control cycle. Errors become a `Fault` transition.
    pub fn tick(&mut self, now: Instant) {
        self.ticks += 1;
        if let Err(e) = self.try_tick(now) {
            error!(error = %e, tick = self.ticks, "tick failed");
            self.state
                .set_state(OperatingState::Fault, format!("Update error: {e}"));
        }
    }

    /// Stop the motors, clear the panel, go `Offline` and publish the final
    /// state regardless of rate limits.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.drive.emergency_stop() {
            warn!(error = %e, "failed to stop motors during shutdown");
        }
        self.drive.set_enabled(false);
        if let Err(e) = self.safety.alert_off() {
            warn!(error = %e, "failed to clear panel during shutdown");
        }
        self.state.set_state(OperatingState::Offline, "Shutting down");
        self.comms.force_publish_state(&self.state.record(Utc::now()));
        info!(ticks = self.ticks, "rover offline");
    }

    // ── Accessors ───────────────────────────────────────────────────────────

    pub fn state(&self) -> OperatingState {
        self.state.current()
    }

    pub fn state_machine(&self) -> &StateMachine {
        &self.state
    }

    pub fn drive(&self) -> &DriveController {
        &self.drive
    }

    pub fn intent(&self) -> DriveIntent {
        self.intent
    }

    pub fn is_latched(&self) -> bool {
        self.safety.is_latched()
    }

    pub fn is_obstacle_stopped(&self) -> bool {
        self.guard.is_stopped()
    }

    pub fn min_distance(&self) -> Option<u32> {
        self.obstacles.min_distance()
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    // ── Tick ────────────────────────────────────────────────────────────────

    fn try_tick(&mut self, now: Instant) -> Result<(), WheelbotError> {
        for command in self.comms.poll_commands() {
            self.handle_command(command)?;
        }

        self.obstacles.update(now);
        self.line.update(now, &mut self.drive);
        if let Some(change) = self.safety.poll_button()? {
            self.on_latch_change(change)?;
        }
        if let Some(reading) = self.climate.update(now) {
            let ts = Utc::now();
            self.comms
                .publish_temperature(&MeasurementRecord::celsius(reading.temperature_c, ts));
            self.comms
                .publish_humidity(&MeasurementRecord::percent(reading.humidity_percent, ts));
        }
        self.color.update(now);

        let min_distance = self.obstacles.min_distance();
        match self.guard.evaluate(min_distance, self.safety.is_latched()) {
            Some(GuardEvent::Stop { distance_cm }) => self.on_obstacle_stop(distance_cm)?,
            Some(GuardEvent::Clear { distance_cm }) => self.on_obstacle_clear(distance_cm)?,
            None => {}
        }

        let target = if self.drive.is_enabled() {
            let cap = self.guard.speed_cap(min_distance, self.max_speed);
            self.intent.speed.clamp(-cap, cap)
        } else {
            0.0
        };
        self.drive.set_target(target);
        self.drive.update()?;

        self.publish_telemetry();
        Ok(())
    }

    fn publish_telemetry(&self) {
        let ts = Utc::now();
        self.comms.publish_state(&self.state.record(ts));
        self.comms
            .publish_obstacles(&self.obstacles.snapshot().to_record(ts));
        if self.line.has_sensors() {
            self.comms.publish_line(&self.line.snapshot().to_record(ts));
        }
        if self.color.has_sensor() {
            self.comms.publish_color(&ColorRecord {
                color: self.color.color().to_string(),
                timestamp: ts,
            });
        }
    }

    // ── Arbitration ─────────────────────────────────────────────────────────

    /// The drive is stopped and disabled before any panel I/O.
    fn on_latch_change(&mut self, change: LatchChange) -> Result<(), WheelbotError> {
        if change.active {
            let stopped = self.drive.emergency_stop();
            self.drive.set_enabled(false);
            self.state.set_state(
                OperatingState::EmergencyStopped,
                format!("Emergency stop activated ({:?})", change.source),
            );
            self.publish_alert(true, "Emergency stop");
            self.safety.show_latch(change)?;
            stopped
        } else if self.guard.is_stopped() {
            self.state.set_state(
                OperatingState::Stopped,
                "Emergency released, obstacle still present",
            );
            self.safety.show_latch(change)?;
            match self.obstacles.min_distance() {
                Some(distance_cm) => self.safety.alert_on(&obstacle_text(distance_cm)),
                None => Ok(()),
            }
        } else {
            self.drive.set_enabled(true);
            self.state
                .set_state(OperatingState::Operating, "Resuming operation");
            self.publish_alert(false, "");
            self.safety.show_latch(change)
        }
    }

    fn on_obstacle_stop(&mut self, distance_cm: u32) -> Result<(), WheelbotError> {
        let stopped = self.drive.emergency_stop();
        self.drive.set_enabled(false);
        self.state.set_state(
            OperatingState::Stopped,
            format!("Obstacle detected: {distance_cm} cm"),
        );
        self.publish_alert(true, &format!("Obstacle at {distance_cm}cm"));
        self.safety.alert_on(&obstacle_text(distance_cm))?;
        stopped
    }

    fn on_obstacle_clear(&mut self, distance_cm: u32) -> Result<(), WheelbotError> {
        debug!(distance_cm, "resuming after obstacle");
        self.drive.set_enabled(true);
        self.state
            .set_state(OperatingState::Operating, "Obstacle cleared");
        self.safety.alert_off()?;
        self.publish_alert(false, "");
        Ok(())
    }

    fn publish_alert(&self, active: bool, message: &str) {
        self.comms.publish_alert(&AlertRecord {
            active,
            message: message.to_string(),
            timestamp: Utc::now(),
        });
    }

    // ── Commands ────────────────────────────────────────────────────────────

    fn handle_command(&mut self, command: Command) -> Result<(), WheelbotError> {
        match command {
            Command::Drive { direction, speed } => self.handle_drive(direction, speed),
            Command::Emergency { stop } => {
                if let Some(change) = self.safety.set_remote(stop) {
                    self.on_latch_change(change)?;
                }
                Ok(())
            }
            Command::Alert { message } => {
                if message.is_empty() {
                    if !self.safety.is_latched() && !self.guard.is_stopped() {
                        self.safety.alert_off()?;
                    }
                    self.publish_alert(false, "");
                } else {
                    self.safety.alert_on(&message)?;
                    self.publish_alert(true, &message);
                }
                Ok(())
            }
            Command::Message { text } => {
                self.safety.display_message(&text)?;
                self.comms.publish_message(&MessageRecord {
                    message: text,
                    timestamp: Utc::now(),
                });
                Ok(())
            }
        }
    }

    fn handle_drive(&mut self, direction: DriveDirection, speed: f64) -> Result<(), WheelbotError> {
        if self.state.current() == OperatingState::EmergencyStopped || self.safety.is_latched() {
            debug!(?direction, speed, "drive command rejected: emergency stop active");
            return Ok(());
        }
        let magnitude = speed.clamp(-1.0, 1.0) * self.max_speed;
        let (intent, next, reason) = match direction {
            DriveDirection::Forward => (magnitude, OperatingState::Operating, "Driving forward"),
            DriveDirection::Backward => (-magnitude, OperatingState::Operating, "Driving backward"),
            DriveDirection::Stop => (0.0, OperatingState::Ready, "Stopped by command"),
        };
        self.intent = DriveIntent {
            speed: intent,
            active: direction != DriveDirection::Stop,
        };
        if self.guard.is_stopped() {
            debug!(intent, "obstacle stop active, drive intent stored");
        } else {
            self.state.set_state(next, reason);
        }
        Ok(())
    }
}

fn obstacle_text(distance_cm: u32) -> String {
    format!("Obstacle\nDistance {distance_cm} cm")
}
