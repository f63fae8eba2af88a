//! Keyboard routing to the active dialog.

use bitflags::bitflags;
use dlg_stack::{ActiveTracker, ClosingStatus, DialogId};
use tracing::trace;

bitflags! {
    /// Modifier keys held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u8 {
        const SHIFT = 0b0001;
        const ALT   = 0b0010;
        const CTRL  = 0b0100;
        const SUPER = 0b1000;
    }
}

/// The keys the dialog stack reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Tab,
    /// Shift-Tab as reported by terminals and some keyboards.
    BackTab,
    Other,
}

/// A key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::empty(),
        }
    }

    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    fn is_back_tab(&self) -> bool {
        self.key == Key::BackTab
            || (self.key == Key::Tab && self.modifiers.contains(Modifiers::SHIFT))
    }
}

/// What a routed key did.
#[derive(Debug)]
pub enum KeyAction {
    /// ESC started a cancel on the active dialog.
    Dismiss(ClosingStatus),
    FocusNext(DialogId),
    FocusPrevious(DialogId),
}

/// Sends keys to whichever dialog the tracker reports active.
#[derive(Debug, Clone)]
pub struct KeyRouter {
    tracker: ActiveTracker,
}

impl KeyRouter {
    #[must_use]
    pub fn new(tracker: ActiveTracker) -> Self {
        Self { tracker }
    }

    /// Route `event`. `None` when nothing is active or the key is not
    /// handled (ESC with close-on-ESC disabled, Tab with cycling disabled).
    pub fn handle(&self, event: &KeyEvent) -> Option<KeyAction> {
        let dialog = self.tracker.get().filter(|d| !d.is_destroying())?;
        let action = match event.key {
            Key::Escape => dialog.on_escape().map(KeyAction::Dismiss),
            Key::Tab | Key::BackTab if event.is_back_tab() => dialog
                .focus_previous()
                .then(|| KeyAction::FocusPrevious(dialog.id())),
            Key::Tab => dialog
                .focus_next()
                .then(|| KeyAction::FocusNext(dialog.id())),
            _ => None,
        };
        trace!(
            id = dialog.id().get(),
            key = ?event.key,
            handled = action.is_some(),
            "key.routed"
        );
        action
    }
}
