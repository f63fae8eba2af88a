//! Class tags understood by presentation surfaces.
//!
//! Tags live in [`Configuration`](crate::Configuration)'s class set and are
//! the only styling signal the core emits.

/// The dialog is the tracked active (topmost) dialog.
pub const ACTIVE: &str = "active";
/// A drag gesture is in progress.
pub const DRAGGING: &str = "dragging";
/// A resize gesture is in progress.
pub const RESIZING: &str = "resizing";
/// The dialog is collapsed to its title row.
pub const COLLAPSED: &str = "collapsed";
/// The dialog fills the viewport.
pub const FULLSCREEN: &str = "fullscreen";
/// This dialog owns the single visible overlay.
pub const OVERLAY_ACTIVE: &str = "overlay-active";
/// The dialog renders without a backdrop.
pub const WITHOUT_OVERLAY: &str = "without-overlay";
/// Desktop layout rules apply even on narrow viewports.
pub const BEHAVIOR_PRESERVED: &str = "behavior-preserved";
