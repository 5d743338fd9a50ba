//! [`StateMachine`] – the robot's operating state.
//!
//! Transitions are not validated: any state may follow any other. Setting
//! the current state again is a no-op and notifies nobody. Listeners are
//! registered up front and called synchronously, in registration order, on
//! every real transition.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::info;
use wheelbot_types::OperatingState;
use wheelbot_types::telemetry::StateRecord;

/// One state change.
#[derive(Debug, Clone, PartialEq)]
pub struct StateTransition {
    pub previous: OperatingState,
    pub current: OperatingState,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

/// Observer of state changes.
pub trait StateListener: Send {
    fn on_transition(&mut self, transition: &StateTransition);
}

pub struct StateMachine {
    current: OperatingState,
    message: String,
    entered_at: Instant,
    entered_wall: DateTime<Utc>,
    listeners: Vec<Box<dyn StateListener>>,
}

impl StateMachine {
    /// Start in [`OperatingState::Initializing`].
    pub fn new() -> Self {
        Self {
            current: OperatingState::Initializing,
            message: "Starting up".to_string(),
            entered_at: Instant::now(),
            entered_wall: Utc::now(),
            listeners: Vec::new(),
        }
    }

    pub fn add_listener(&mut self, listener: Box<dyn StateListener>) {
        self.listeners.push(listener);
    }

    /// Move to `state`. Returns the transition, or `None` if `state` is
    /// already current.
    pub fn set_state(
        &mut self,
        state: OperatingState,
        reason: impl Into<String>,
    ) -> Option<StateTransition> {
        if state == self.current {
            return None;
        }
        let transition = StateTransition {
            previous: self.current,
            current: state,
            reason: reason.into(),
            timestamp: Utc::now(),
        };
        self.current = state;
        self.message = transition.reason.clone();
        self.entered_at = Instant::now();
        self.entered_wall = transition.timestamp;

        info!(
            from = %transition.previous,
            to = %transition.current,
            reason = %transition.reason,
            "state changed"
        );
        for listener in &mut self.listeners {
            listener.on_transition(&transition);
        }
        Some(transition)
    }

    pub fn current(&self) -> OperatingState {
        self.current
    }

    /// Reason given for the last transition.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn state_duration(&self) -> Duration {
        self.entered_at.elapsed()
    }

    /// Wall-clock time the current state was entered.
    pub fn entered_at(&self) -> DateTime<Utc> {
        self.entered_wall
    }

    pub fn wire_str(&self) -> &'static str {
        self.current.wire_str()
    }

    pub fn display_str(&self) -> &'static str {
        self.current.display_str()
    }

    pub fn record(&self, timestamp: DateTime<Utc>) -> StateRecord {
        let duration_ms = u64::try_from(self.state_duration().as_millis()).unwrap_or(u64::MAX);
        StateRecord::new(self.current, self.message.clone(), duration_ms, timestamp)
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new()
    }
}
