//! [`SafetyPanel`] – the emergency-stop latch and the operator panel.
//!
//! The latch has two sources:
//!
//! * the physical button, edge-triggered: each press toggles the latch,
//!   releases do nothing;
//! * the remote operator, level-triggered: an explicit on/off value.
//!
//! Flipping the latch touches no hardware besides the button, so a change is
//! always handed back as a [`LatchChange`] even when the panel is broken.
//! The caller mirrors it on the panel afterwards with
//! [`SafetyPanel::show_latch`]: LED on plus an emergency message while
//! latched, both cleared on release.
//!
//! Display writes are skipped when the text equals the last text written;
//! LED writes are skipped when the LED is already in the requested state.

use tracing::{debug, info};
use wheelbot_hal::{Indicator, PushButton, TextDisplay};
use wheelbot_types::WheelbotError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatchSource {
    Button,
    Remote,
}

/// A change of the emergency latch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatchChange {
    pub active: bool,
    pub source: LatchSource,
}

pub struct SafetyPanel {
    indicator: Option<Box<dyn Indicator>>,
    display: Option<Box<dyn TextDisplay>>,
    button: Option<Box<dyn PushButton>>,
    latched: bool,
    button_was_pressed: bool,
    last_text: Option<String>,
    led_on: Option<bool>,
}

impl SafetyPanel {
    pub fn new(
        indicator: Option<Box<dyn Indicator>>,
        display: Option<Box<dyn TextDisplay>>,
        button: Option<Box<dyn PushButton>>,
    ) -> Self {
        Self {
            indicator,
            display,
            button,
            latched: false,
            button_was_pressed: false,
            last_text: None,
            led_on: None,
        }
    }

    /// Switch the LED off and sample the button so a press held through
    /// boot does not count as an edge.
    pub fn init(&mut self) -> Result<(), WheelbotError> {
        self.set_led(false)?;
        if let Some(button) = self.button.as_mut() {
            self.button_was_pressed = button.is_pressed()?;
        }
        Ok(())
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }

    /// Sample the button; a new press toggles the latch.
    ///
    /// # Errors
    ///
    /// Returns the button's read error. The latch is unchanged in that case.
    pub fn poll_button(&mut self) -> Result<Option<LatchChange>, WheelbotError> {
        let Some(button) = self.button.as_mut() else {
            return Ok(None);
        };
        let pressed = button.is_pressed()?;
        let edge = pressed && !self.button_was_pressed;
        if pressed != self.button_was_pressed {
            debug!(pressed, "emergency button changed");
        }
        self.button_was_pressed = pressed;
        if !edge {
            return Ok(None);
        }
        let active = !self.latched;
        Ok(Some(self.flip(active, LatchSource::Button)))
    }

    /// Set the latch from the remote. Returns `None` if unchanged.
    pub fn set_remote(&mut self, active: bool) -> Option<LatchChange> {
        if active == self.latched {
            return None;
        }
        Some(self.flip(active, LatchSource::Remote))
    }

    fn flip(&mut self, active: bool, source: LatchSource) -> LatchChange {
        self.latched = active;
        info!(active, ?source, "emergency latch changed");
        LatchChange { active, source }
    }

    /// Mirror a latch change on the panel.
    pub fn show_latch(&mut self, change: LatchChange) -> Result<(), WheelbotError> {
        if change.active {
            let origin = match change.source {
                LatchSource::Button => "Button",
                LatchSource::Remote => "Remote",
            };
            self.alert_on(&format!("Emergency Stop\n{origin}"))
        } else {
            self.alert_off()
        }
    }

    /// Show `text` and light the LED.
    pub fn alert_on(&mut self, text: &str) -> Result<(), WheelbotError> {
        self.display_message(text)?;
        self.set_led(true)
    }

    /// Clear the display and the LED.
    pub fn alert_off(&mut self) -> Result<(), WheelbotError> {
        self.display_message("")?;
        self.set_led(false)
    }

    /// Show `text` without touching the LED.
    pub fn display_message(&mut self, text: &str) -> Result<(), WheelbotError> {
        if self.last_text.as_deref() == Some(text) {
            return Ok(());
        }
        if let Some(display) = self.display.as_mut() {
            display.set_text(text)?;
        }
        self.last_text = Some(text.to_string());
        Ok(())
    }

    fn set_led(&mut self, on: bool) -> Result<(), WheelbotError> {
        if self.led_on == Some(on) {
            return Ok(());
        }
        if let Some(indicator) = self.indicator.as_mut() {
            indicator.set_state(on)?;
        }
        self.led_on = Some(on);
        Ok(())
    }
}
