//! Operator panel: the text display, the emergency-stop button and the
//! alert LED.

use wheelbot_types::WheelbotError;

/// A character display such as a 16x2 LCD. `\n` starts the second line.
pub trait TextDisplay: Send {
    fn id(&self) -> &str;

    fn set_text(&mut self, text: &str) -> Result<(), WheelbotError>;
}

/// A momentary push button.
pub trait PushButton: Send {
    fn id(&self) -> &str;

    /// `true` while the button is held down.
    fn is_pressed(&mut self) -> Result<bool, WheelbotError>;
}

/// A discrete on/off indicator such as an LED.
pub trait Indicator: Send {
    fn id(&self) -> &str;

    fn set_state(&mut self, on: bool) -> Result<(), WheelbotError>;

    /// The last state written.
    fn state(&self) -> bool;
}
