//! `wheelbot-hal` – hardware abstraction layer.
//!
//! The control stack never touches pins or buses directly. It consumes the
//! narrow "read latest value" / "write actuator" traits defined here, and a
//! [`HardwareSet`] bundles one driver per slot for the orchestrator.
//!
//! # Modules
//!
//! - [`ranging`] – [`RangeSensor`] for ultrasonic distance sensors.
//! - [`reflective`] – [`AnalogInput`], [`LineSensor`] and the debounced
//!   [`ReflectiveLineSensor`].
//! - [`motor`] – [`MotorDriver`] for the differential drive.
//! - [`panel`] – operator panel: [`TextDisplay`], [`PushButton`], [`Indicator`].
//! - [`environment`] – [`ClimateSensor`] and [`ColorSensor`].
//! - [`hardware`] – the [`HardwareSet`] slot container.
//! - [`sim`] – in-process simulated drivers for tests and headless runs.

pub mod environment;
pub mod hardware;
pub mod motor;
pub mod panel;
pub mod ranging;
pub mod reflective;
pub mod sim;

pub use environment::{ClimateReading, ClimateSensor, ColorSensor, RgbReading};
pub use hardware::{HardwareSet, LineSlot, RangerSlot};
pub use motor::MotorDriver;
pub use panel::{Indicator, PushButton, TextDisplay};
pub use ranging::RangeSensor;
pub use reflective::{AnalogInput, LineSensor, ReflectiveLineSensor};
