#![forbid(unsafe_code)]

//! Edge and corner resizing.
//!
//! A resize session starts on a handle press, tracks a preview size while
//! the pointer moves, and commits pixel sizes through `set_width` /
//! `set_height` on release. The preview never shrinks below the
//! configured minimum on either axis.

use bitflags::bitflags;
use dlg_core::{Dimension, Offset, Size, class_name};
use dlg_stack::{DialogHandle, WeakDialog};
use tracing::{debug, trace};

use crate::pointer::{PointerButton, PointerEvent};

bitflags! {
    /// Which edges a resize handle moves.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ResizeEdges: u8 {
        const RIGHT  = 0b01;
        const BOTTOM = 0b10;
        /// Bottom-right corner.
        const BOTH   = Self::RIGHT.bits() | Self::BOTTOM.bits();
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ResizeSession {
    edges: ResizeEdges,
    origin: Offset,
    size: Size,
    moved: bool,
}

/// Resizes one dialog from its handles.
#[derive(Debug)]
pub struct ResizeController {
    dialog: WeakDialog,
    session: Option<ResizeSession>,
}

impl ResizeController {
    #[must_use]
    pub fn new(dialog: &DialogHandle) -> Self {
        Self {
            dialog: dialog.downgrade(),
            session: None,
        }
    }

    #[must_use]
    pub fn is_resizing(&self) -> bool {
        self.session.is_some_and(|s| s.moved)
    }

    /// Current preview size, once the pointer has moved.
    #[must_use]
    pub fn preview(&self) -> Option<Size> {
        self.session.filter(|s| s.moved).map(|s| s.size)
    }

    /// Handle pressed. Returns whether a session started.
    pub fn pointer_down(&mut self, event: &PointerEvent, edges: ResizeEdges) -> bool {
        self.session = None;
        let Some(dialog) = self.dialog.upgrade() else {
            return false;
        };
        if edges.is_empty() || event.button == PointerButton::Secondary {
            return false;
        }
        let policy = dialog.policy();
        let possible = dialog.configuration().read(|c| {
            !c.is_maximized()
                && c.is_resizable()
                && (policy.allows_pointer_layout(c.viewport().width)
                    || c.is_desktop_behavior_preserved())
        });
        if !possible {
            return false;
        }
        self.session = Some(ResizeSession {
            edges,
            origin: dialog.rendered_offset(),
            size: dialog.rendered_size(),
            moved: false,
        });
        trace!(id = dialog.id().get(), ?edges, "resize.armed");
        true
    }

    /// Pointer moved. Returns the preview size.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> Option<Size> {
        let mut session = self.session?;
        let Some(dialog) = self.dialog.upgrade() else {
            self.session = None;
            return None;
        };
        let (min_width, min_height) = dialog
            .configuration()
            .read(|c| (pixels(c.min_width()), pixels(c.min_height())));

        if session.edges.contains(ResizeEdges::RIGHT) {
            session.size.width = (event.x - session.origin.left).max(min_width);
        }
        if session.edges.contains(ResizeEdges::BOTTOM) {
            session.size.height = (event.y - session.origin.top).max(min_height);
        }
        if !session.moved {
            session.moved = true;
            dialog.configure(|c| c.add_class(class_name::RESIZING));
            debug!(id = dialog.id().get(), "resize.start");
        }
        self.session = Some(session);
        Some(session.size)
    }

    /// Pointer released. Returns the committed size.
    pub fn pointer_up(&mut self, _event: &PointerEvent) -> Option<Size> {
        let session = self.session.take()?;
        if !session.moved {
            return None;
        }
        let dialog = self.dialog.upgrade()?;
        dialog.configure(|c| {
            if session.edges.contains(ResizeEdges::RIGHT) && session.size.width > 0.0 {
                c.set_width(Some(Dimension::px(session.size.width)), true);
            }
            if session.edges.contains(ResizeEdges::BOTTOM) && session.size.height > 0.0 {
                c.set_height(Some(Dimension::px(session.size.height)), true);
            }
            c.remove_class(class_name::RESIZING);
        });
        dialog.auto_focus();
        debug!(
            id = dialog.id().get(),
            width = session.size.width,
            height = session.size.height,
            "resize.stop"
        );
        Some(session.size)
    }

    /// Abandon the session without committing.
    pub fn cancel(&mut self) {
        if let Some(session) = self.session.take() {
            if session.moved {
                if let Some(dialog) = self.dialog.upgrade() {
                    dialog.configure(|c| c.remove_class(class_name::RESIZING));
                }
            }
        }
    }
}

/// Pixel value of an optional minimum; percentages and unset read as zero.
fn pixels(dimension: Option<Dimension>) -> f64 {
    dimension
        .filter(|d| d.units == dlg_core::DimensionUnits::Pixel)
        .map_or(0.0, |d| d.value)
}
