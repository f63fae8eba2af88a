#![forbid(unsafe_code)]

//! Core state for the dialog stack.
//!
//! This crate holds everything about a dialog that can be reasoned about
//! without a host UI or an async runtime:
//!
//! - [`Dimension`]: an immutable `(value, units)` pair for sizes and offsets.
//! - [`Configuration`]: the authoritative per-dialog state. It is mutated
//!   only through its own setters and broadcasts a [`ConfigurationEvent`]
//!   for every change on a [`ChangeStream`].
//! - [`BoundBox`], [`Offset`], [`Size`]: viewport and layout geometry.
//! - [`DialogSettings`]: the tunable constants ([`DialogPolicy`]) and focus
//!   selectors ([`FocusSettings`]) shared by every dialog of a service.
//!
//! # Invariants
//!
//! 1. A [`Configuration`] never stores a position that was not clamped
//!    against its current bound box.
//! 2. Maximize and collapse transitions are reversible: entering and then
//!    leaving either mode restores the saved sizes and flags exactly.
//! 3. Change events are delivered in emission order, and never while the
//!    emitting [`Configuration`] is mutably borrowed through a
//!    [`SharedConfiguration`].

pub mod change;
pub mod class_name;
pub mod configuration;
pub mod dimension;
pub mod error;
pub mod geometry;
pub mod settings;

pub use change::{BatchScope, ChangeStream, Subscription};
pub use configuration::{
    Axis, Configuration, ConfigurationEvent, ConfigurationSnapshot, SavedState,
    SharedConfiguration,
};
pub use dimension::{Dimension, DimensionUnits};
pub use error::{ParseUnitsError, SettingsError};
pub use geometry::{BoundBox, Offset, Size};
pub use settings::{DialogPolicy, DialogSettings, FocusSettings};
