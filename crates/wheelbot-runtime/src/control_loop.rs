//! [`ControlLoop`] – drives a [`Rover`] on a dedicated thread.
//!
//! The loop owns the rover, ticks it back to back with a short sleep in
//! between, and checks a shared shutdown flag before every tick. Once the
//! flag is raised the rover is shut down and the loop returns.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::info;

use crate::rover::Rover;

pub struct ControlLoop {
    rover: Rover,
    spacing: Duration,
    shutdown: Arc<AtomicBool>,
}

impl ControlLoop {
    pub fn new(rover: Rover, spacing: Duration, shutdown: Arc<AtomicBool>) -> Self {
        Self {
            rover,
            spacing,
            shutdown,
        }
    }

    /// Start the rover and tick until shutdown is requested. Returns the
    /// rover, now offline, so callers can inspect its final state.
    pub fn run(mut self) -> Rover {
        let initial = self.rover.start();
        info!(state = %initial, spacing = ?self.spacing, "control loop running");

        while !self.shutdown.load(Ordering::SeqCst) {
            self.rover.tick(Instant::now());
            if !self.spacing.is_zero() {
                thread::sleep(self.spacing);
            }
        }

        self.rover.shutdown();
        info!(ticks = self.rover.tick_count(), "control loop stopped");
        self.rover
    }

    /// Run on a named OS thread.
    ///
    /// # Errors
    ///
    /// Returns the I/O error when the thread cannot be spawned.
    pub fn spawn(self) -> std::io::Result<JoinHandle<Rover>> {
        thread::Builder::new()
            .name("wheelbot-control".to_string())
            .spawn(move || self.run())
    }
}
