//! `wheelbot-perception` – turns raw sensor reads into snapshots the
//! orchestrator can act on.
//!
//! Every monitor here owns its drivers, paces itself with a
//! [`PeriodTimer`][period::PeriodTimer] against the caller's tick instant,
//! and never lets a failing sensor stall the tick.
//!
//! # Modules
//!
//! - [`obstacle`] – per-direction and overall minimum distance.
//! - [`line`] – line presence per direction plus the steering callback.
//! - [`climate`] – temperature/humidity sampling with a minimum read spacing.
//! - [`color`] – RGB color classification.
//! - [`period`] – the shared scan-interval timer.

pub mod climate;
pub mod color;
pub mod line;
pub mod obstacle;
pub mod period;

pub use climate::ClimateMonitor;
pub use color::{ColorClass, ColorMonitor};
pub use line::{LineDetector, LineListener, LineSnapshot, LineState};
pub use obstacle::{ObstacleDetector, ObstacleSnapshot};
pub use period::PeriodTimer;
