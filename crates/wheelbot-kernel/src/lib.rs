//! `wheelbot-kernel` – safety and state.
//!
//! The rules every tick must respect, independent of how inputs arrive.
//!
//! # Modules
//!
//! - [`state_machine`] – [`StateMachine`][state_machine::StateMachine]: the
//!   robot's operating state, transition timestamps and listeners.
//! - [`safety`] – [`SafetyPanel`][safety::SafetyPanel]: the emergency-stop
//!   latch fed by the button and the remote, plus the alert LED and display.
//! - [`obstacle_guard`] – [`ObstacleGuard`][obstacle_guard::ObstacleGuard]:
//!   stop/clear hysteresis on the nearest obstacle and distance speed bands.

pub mod obstacle_guard;
pub mod safety;
pub mod state_machine;

pub use obstacle_guard::{GuardEvent, ObstacleGuard};
pub use safety::{LatchChange, LatchSource, SafetyPanel};
pub use state_machine::{StateListener, StateMachine, StateTransition};
