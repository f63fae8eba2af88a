//! Pointer events in viewport pixels.

use dlg_core::Offset;
use web_time::Instant;

/// Pointer buttons, numbered like DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PointerButton {
    /// Primary button, or a touch contact.
    #[default]
    Main,
    Auxiliary,
    /// Context-menu button; never starts a drag or resize.
    Secondary,
    Back,
    Forward,
}

/// A pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
    pub at: Instant,
}

impl PointerEvent {
    /// Main-button sample taken now.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self::at(x, y, Instant::now())
    }

    #[must_use]
    pub fn at(x: f64, y: f64, at: Instant) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Main,
            at,
        }
    }

    #[must_use]
    pub const fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }

    #[must_use]
    pub const fn position(&self) -> Offset {
        Offset::new(self.x, self.y)
    }
}
