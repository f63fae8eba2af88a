#![forbid(unsafe_code)]

//! Input translation for dialogs.
//!
//! The controllers here are sans-IO state machines: the host feeds them
//! pointer and key events, they call back into the dialog's configuration.
//! Bound-box clamping always happens in the configuration setters, never
//! here.
//!
//! - [`DragController`]: press-and-hold, then move the dialog.
//! - [`ResizeController`]: grab the right edge, bottom edge or corner.
//! - [`KeyRouter`]: ESC and Tab/Shift-Tab for the active dialog.

pub mod drag;
pub mod keys;
pub mod pointer;
pub mod resize;

pub use drag::DragController;
pub use keys::{Key, KeyAction, KeyEvent, KeyRouter, Modifiers};
pub use pointer::{PointerButton, PointerEvent};
pub use resize::{ResizeController, ResizeEdges};
