//! Contracts for the host-side collaborators the core drives.
//!
//! The core never touches a view tree. An [`Anchor`] (mount point) creates
//! one [`PresentationSurface`] per dialog; the surface renders the
//! configuration, reports rendered geometry, and owns focus trapping.

use std::rc::Rc;

use dlg_core::{BoundBox, ConfigurationEvent, ConfigurationSnapshot, FocusSettings, Offset, Size};
use futures::future::LocalBoxFuture;

use crate::content::ContentRef;
use crate::error::FocusError;
use crate::event::DialogId;

/// Everything an anchor needs to build a surface.
pub struct SurfaceRequest<'a> {
    pub id: DialogId,
    pub content: &'a ContentRef,
    pub focus: &'a FocusSettings,
    pub snapshot: &'a ConfigurationSnapshot,
}

/// One rendered dialog window.
pub trait PresentationSurface {
    /// Render a full configuration snapshot.
    fn apply(&self, snapshot: &ConfigurationSnapshot);

    /// React to a single configuration change (class tags included).
    fn on_change(&self, event: &ConfigurationEvent);

    fn set_title(&self, title: Option<&str>);

    /// Current rendered size.
    fn rendered_size(&self) -> Size;

    /// Current rendered top-left corner.
    fn rendered_offset(&self) -> Offset;

    /// Viewport the surface lives in. Read when the initial position is
    /// computed; an unbounded box falls back to the anchor's viewport.
    fn bound_box(&self) -> BoundBox;

    /// Run the focus-trap auto-focus algorithm.
    fn auto_focus(&self);

    /// Move focus to the next focusable element, wrapping.
    fn focus_next(&self) {}

    /// Move focus to the previous focusable element, wrapping.
    fn focus_previous(&self) {}

    /// Resolves once, when the surface has rendered for the first time.
    fn view_ready(&self) -> LocalBoxFuture<'static, ()>;

    fn destroy(&self);
}

/// A mount point dialogs are inserted into.
pub trait Anchor {
    fn create_surface(&self, request: SurfaceRequest<'_>) -> Rc<dyn PresentationSurface>;

    fn viewport(&self) -> BoundBox;

    /// The element focused right now, recorded as the focus-return target
    /// when a dialog opens without an explicit one.
    fn focused_element(&self) -> Option<Rc<dyn FocusTarget>> {
        None
    }
}

/// Something focus can be handed back to when a dialog closes.
pub trait FocusTarget {
    fn focus(&self) -> Result<(), FocusError>;
}
