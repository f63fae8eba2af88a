#![forbid(unsafe_code)]

//! Press-and-hold dragging.
//!
//! # State machine
//!
//! ```text
//! Idle --down--> Armed --move after hold--> Dragging --up--> Idle (commit)
//!                  |                           |
//!                  +--up / move before hold--> Idle   (no commit)
//! ```
//!
//! While dragging only a preview offset is tracked; the configuration is
//! written once, on release, through `set_left_position`/`set_top_position`
//! so clamping applies to the committed value.
//!
//! # Failure Modes
//!
//! - **Dialog dropped mid-drag**: every call becomes a no-op and the
//!   controller resets to idle.

use std::time::Duration;

use dlg_core::{Configuration, Offset, class_name};
use dlg_stack::{DialogHandle, WeakDialog};
use tracing::{debug, trace};
use web_time::Instant;

use crate::pointer::{PointerButton, PointerEvent};

#[derive(Debug, Clone, Copy, PartialEq)]
enum DragState {
    Idle,
    Armed { pressed_at: Instant, grab: Offset },
    Dragging { grab: Offset, preview: Offset },
}

/// Drags one dialog by its header.
#[derive(Debug)]
pub struct DragController {
    dialog: WeakDialog,
    hold: Duration,
    state: DragState,
}

impl DragController {
    /// Controller for `dialog`, using the dialog's policy hold time.
    #[must_use]
    pub fn new(dialog: &DialogHandle) -> Self {
        Self {
            dialog: dialog.downgrade(),
            hold: dialog.policy().drag_hold(),
            state: DragState::Idle,
        }
    }

    #[must_use]
    pub fn with_hold(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    #[must_use]
    pub fn is_armed(&self) -> bool {
        matches!(self.state, DragState::Armed { .. })
    }

    /// Where the dialog would land if released now.
    #[must_use]
    pub fn preview(&self) -> Option<Offset> {
        match self.state {
            DragState::Dragging { preview, .. } => Some(preview),
            _ => None,
        }
    }

    /// Header pressed. Returns whether a drag was armed.
    pub fn pointer_down(&mut self, event: &PointerEvent) -> bool {
        self.state = DragState::Idle;
        let Some(dialog) = self.dialog.upgrade() else {
            return false;
        };
        if event.button == PointerButton::Secondary || !Self::drag_possible(&dialog) {
            return false;
        }
        let at = dialog.rendered_offset();
        let grab = Offset::new(event.x - at.left, event.y - at.top);
        self.state = DragState::Armed {
            pressed_at: event.at,
            grab,
        };
        trace!(id = dialog.id().get(), "drag.armed");
        true
    }

    /// Pointer moved anywhere. Returns the preview offset while dragging.
    pub fn pointer_move(&mut self, event: &PointerEvent) -> Option<Offset> {
        let grab = match self.state {
            DragState::Idle => return None,
            DragState::Armed { pressed_at, grab } => {
                if event.at.duration_since(pressed_at) < self.hold {
                    return None;
                }
                let dialog = self.live()?;
                dialog.configure(|c| c.add_class(class_name::DRAGGING));
                debug!(id = dialog.id().get(), "drag.start");
                grab
            }
            DragState::Dragging { grab, .. } => grab,
        };
        let preview = Offset::new(event.x - grab.left, event.y - grab.top);
        self.state = DragState::Dragging { grab, preview };
        Some(preview)
    }

    /// Pointer released. Returns the committed (clamped) position.
    pub fn pointer_up(&mut self, _event: &PointerEvent) -> Option<Offset> {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let DragState::Dragging { preview, .. } = state else {
            return None;
        };
        let dialog = self.dialog.upgrade()?;

        let committed = if dialog.is_active() {
            Some(dialog.configure(|c| {
                c.set_left_position(preview.left);
                c.set_top_position(preview.top);
                Offset::new(
                    c.left_position().map_or(preview.left, |d| d.value),
                    c.top_position().map_or(preview.top, |d| d.value),
                )
            }))
        } else {
            None
        };

        dialog.auto_focus();
        dialog.configure(|c| c.remove_class(class_name::DRAGGING));
        debug!(id = dialog.id().get(), ?committed, "drag.stop");
        committed
    }

    /// Abandon the gesture without committing.
    pub fn cancel(&mut self) {
        let was_dragging = self.is_dragging();
        self.state = DragState::Idle;
        if was_dragging {
            if let Some(dialog) = self.dialog.upgrade() {
                dialog.configure(|c| c.remove_class(class_name::DRAGGING));
            }
        }
    }

    fn live(&mut self) -> Option<DialogHandle> {
        let dialog = self.dialog.upgrade().filter(|d| !d.is_destroying());
        if dialog.is_none() {
            self.state = DragState::Idle;
        }
        dialog
    }

    fn drag_possible(dialog: &DialogHandle) -> bool {
        if !dialog.is_active() || dialog.is_destroying() {
            return false;
        }
        let policy = dialog.policy();
        dialog.configuration().read(|c: &Configuration| {
            c.is_draggable() && policy.allows_pointer_layout(c.viewport().width)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dlg_core::{BoundBox, DialogSettings, Dimension};
    use dlg_stack::{ActiveTracker, DialogCollection};
    use futures::executor::LocalPool;
    use std::rc::Rc;

    fn setup(pool: &LocalPool, viewport: BoundBox) -> (DialogCollection, DialogHandle) {
        let collection = DialogCollection::new(
            ActiveTracker::new(),
            Rc::new(pool.spawner()),
            Rc::new(DialogSettings::default()),
        );
        let dialog = collection
            .create(None)
            .set_dimensions(200.0, 300.0)
            .draggable(true);
        dialog.configure(|c| {
            c.set_viewport(viewport);
            c.set_position(100.0, 100.0);
        });
        dialog.activate();
        (collection, dialog)
    }

    fn ms(start: Instant, millis: u64) -> Instant {
        start + Duration::from_millis(millis)
    }

    #[test]
    fn drag_commits_after_hold() {
        let pool = LocalPool::new();
        let (_c, dialog) = setup(&pool, BoundBox::new(1200.0, 800.0));
        let mut drag = DragController::new(&dialog);
        let t0 = Instant::now();

        assert!(drag.pointer_down(&PointerEvent::at(110.0, 105.0, t0)));
        assert_eq!(drag.pointer_move(&PointerEvent::at(150.0, 150.0, ms(t0, 50))), None);
        assert!(drag.is_armed());

        let preview = drag.pointer_move(&PointerEvent::at(410.0, 305.0, ms(t0, 200)));
        assert_eq!(preview, Some(Offset::new(400.0, 300.0)));
        assert!(dialog.has_class(class_name::DRAGGING));

        let committed = drag.pointer_up(&PointerEvent::at(410.0, 305.0, ms(t0, 250)));
        assert_eq!(committed, Some(Offset::new(400.0, 300.0)));
        assert!(!dialog.has_class(class_name::DRAGGING));
        assert_eq!(dialog.snapshot().left, Some(Dimension::px(400.0)));
    }

    #[test]
    fn release_before_hold_does_nothing() {
        let pool = LocalPool::new();
        let (_c, dialog) = setup(&pool, BoundBox::new(1200.0, 800.0));
        let mut drag = DragController::new(&dialog);
        let t0 = Instant::now();
        assert!(drag.pointer_down(&PointerEvent::at(110.0, 105.0, t0)));
        assert_eq!(drag.pointer_up(&PointerEvent::at(300.0, 300.0, ms(t0, 100))), None);
        assert_eq!(dialog.snapshot().left, Some(Dimension::px(100.0)));
    }

    #[test]
    fn committed_position_is_clamped() {
        let pool = LocalPool::new();
        let (_c, dialog) = setup(&pool, BoundBox::new(1000.0, 700.0));
        let mut drag = DragController::new(&dialog).with_hold(Duration::ZERO);
        let t0 = Instant::now();
        assert!(drag.pointer_down(&PointerEvent::at(100.0, 100.0, t0)));
        drag.pointer_move(&PointerEvent::at(5000.0, -400.0, t0));
        let committed = drag.pointer_up(&PointerEvent::at(5000.0, -400.0, t0));
        assert_eq!(committed, Some(Offset::new(970.0, 0.0)));
    }

    #[test]
    fn refused_on_compact_viewport_secondary_button_or_inactive() {
        let pool = LocalPool::new();
        let (c, dialog) = setup(&pool, BoundBox::new(600.0, 800.0));
        let mut drag = DragController::new(&dialog);
        assert!(!drag.pointer_down(&PointerEvent::new(10.0, 10.0)));

        dialog.configure(|cfg| cfg.set_viewport(BoundBox::new(1200.0, 800.0)));
        let right = PointerEvent::new(10.0, 10.0).with_button(PointerButton::Secondary);
        assert!(!drag.pointer_down(&right));
        assert!(drag.pointer_down(&PointerEvent::new(10.0, 10.0)));

        let other = c.create(None);
        other.activate();
        assert!(!drag.pointer_down(&PointerEvent::new(10.0, 10.0)));
    }

    #[test]
    fn not_draggable_is_refused() {
        let pool = LocalPool::new();
        let (_c, dialog) = setup(&pool, BoundBox::new(1200.0, 800.0));
        dialog.configure(|c| c.set_draggable(false, true));
        let mut drag = DragController::new(&dialog);
        assert!(!drag.pointer_down(&PointerEvent::new(10.0, 10.0)));
    }
}
