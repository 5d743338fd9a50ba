//! `wheelbot-runtime` – the robot's control core.
//!
//! * [`drive`] – speed ramp, line steering and motor output.
//! * [`rover`] – the orchestrator tying sensing, safety, drive and telemetry
//!   into one tick.
//! * [`control_loop`] – runs a rover on its own thread until shutdown.
//! * [`telemetry`] – `tracing` subscriber and OTLP export setup.

pub mod control_loop;
pub mod drive;
pub mod rover;
pub mod telemetry;

pub use control_loop::ControlLoop;
pub use drive::{DriveController, Steering};
pub use rover::{DriveIntent, Rover};
