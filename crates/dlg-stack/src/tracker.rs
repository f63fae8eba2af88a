#![forbid(unsafe_code)]

//! Process-wide record of the active dialog and the overlay owner.
//!
//! # Design
//!
//! [`ActiveTracker`] is a cloneable handle. [`ActiveTracker::global`] returns
//! the per-thread instance that services use by default; tests construct
//! their own with [`ActiveTracker::new`]. The tracker never owns dialogs: it
//! stores [`WeakDialog`]s and skips entries that are dead or destroying.
//!
//! # Invariants
//!
//! 1. At most one dialog carries the `active` tag, and it is the one
//!    [`ActiveTracker::get`] returns.
//! 2. At most one dialog carries the `overlay-active` tag: the most recently
//!    activated overlay-bearing dialog that is still alive and not
//!    destroying.
//! 3. A newly activated dialog's stack order is strictly greater than the
//!    order of every dialog activated before it, until orders saturate at
//!    `u32::MAX`.
//!
//! # Failure Modes
//!
//! - **Re-entrant `set`**: a `set` issued while another `set` is running
//!   (for example from a class-change subscriber) is dropped with a warning.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use dlg_core::class_name;
use tracing::{debug, debug_span, warn};

use crate::handle::{DialogHandle, WeakDialog};

struct TrackerInner {
    active: RefCell<Option<WeakDialog>>,
    /// Overlay-bearing dialogs in activation order; the last live one owns
    /// the overlay.
    overlays: RefCell<Vec<WeakDialog>>,
    /// Highest order ever assigned.
    high_water: Cell<u32>,
    busy: Cell<bool>,
}

/// Shared active-dialog tracker.
#[derive(Clone)]
pub struct ActiveTracker {
    inner: Rc<TrackerInner>,
}

thread_local! {
    static GLOBAL: ActiveTracker = ActiveTracker::new();
}

impl Default for ActiveTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ActiveTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveTracker")
            .field("active", &self.get().map(|d| d.id()))
            .field("overlay", &self.overlay_owner().map(|d| d.id()))
            .field("high_water", &self.inner.high_water.get())
            .finish()
    }
}

struct BusyReset<'a>(&'a Cell<bool>);

impl Drop for BusyReset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl ActiveTracker {
    /// A fresh, empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(TrackerInner {
                active: RefCell::new(None),
                overlays: RefCell::new(Vec::new()),
                high_water: Cell::new(0),
                busy: Cell::new(false),
            }),
        }
    }

    /// The tracker shared by every service on this thread.
    #[must_use]
    pub fn global() -> Self {
        GLOBAL.with(Clone::clone)
    }

    /// Whether both handles refer to the same tracker.
    #[must_use]
    pub fn same_tracker(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The tracked active dialog, if it is still alive.
    #[must_use]
    pub fn get(&self) -> Option<DialogHandle> {
        self.inner.active.borrow().as_ref().and_then(WeakDialog::upgrade)
    }

    #[must_use]
    pub fn is_active(&self, dialog: &DialogHandle) -> bool {
        self.inner
            .active
            .borrow()
            .as_ref()
            .is_some_and(|w| w.points_to(dialog))
    }

    /// The dialog that owns the visible overlay.
    #[must_use]
    pub fn overlay_owner(&self) -> Option<DialogHandle> {
        self.inner
            .overlays
            .borrow()
            .iter()
            .rev()
            .filter_map(WeakDialog::upgrade)
            .find(|d| !d.is_destroying())
    }

    /// Make `dialog` the active, topmost dialog.
    pub fn set(&self, dialog: &DialogHandle) {
        if self.inner.busy.get() {
            warn!(id = dialog.id().get(), "tracker.set re-entered; ignoring");
            return;
        }
        if self.is_active(dialog) {
            return;
        }
        if dialog.is_destroying() {
            debug!(id = dialog.id().get(), "tracker.set on a destroying dialog; ignoring");
            return;
        }
        self.inner.busy.set(true);
        let _reset = BusyReset(&self.inner.busy);
        let _span = debug_span!("tracker.set", id = dialog.id().get()).entered();

        let current = self.get();
        let new_order = current
            .as_ref()
            .and_then(DialogHandle::order)
            .unwrap_or(0)
            .max(dialog.order().unwrap_or(0))
            .max(dialog.policy().default_z_index)
            .max(self.inner.high_water.get());

        if let Some(current) = &current {
            current.mark_active(false);
        }
        if dialog.order().unwrap_or(0) <= new_order {
            dialog.assign_order(new_order.saturating_add(1));
        }
        if let Some(order) = dialog.order() {
            self.inner.high_water.set(order.max(self.inner.high_water.get()));
        }
        dialog.mark_active(true);
        dialog.auto_focus();
        *self.inner.active.borrow_mut() = Some(dialog.downgrade());
        debug!(id = dialog.id().get(), order = ?dialog.order(), "tracker.activated");

        if dialog.is_overlay_visible() {
            if let Some(owner) = self.overlay_owner() {
                if !owner.ptr_eq(dialog) {
                    owner.untag(class_name::OVERLAY_ACTIVE);
                }
            }
            dialog.tag(class_name::OVERLAY_ACTIVE);
            let mut overlays = self.inner.overlays.borrow_mut();
            overlays.retain(|w| !w.points_to(dialog));
            overlays.push(dialog.downgrade());
        }

        self.prune_overlays();
    }

    /// Untag and forget everything tracked.
    pub fn clear(&self) {
        if let Some(owner) = self.overlay_owner() {
            owner.untag(class_name::OVERLAY_ACTIVE);
        }
        let active = self.inner.active.borrow_mut().take();
        if let Some(active) = active.as_ref().and_then(WeakDialog::upgrade) {
            active.mark_active(false);
        }
        self.inner.overlays.borrow_mut().clear();
        debug!("tracker.cleared");
    }

    /// Drop every reference to `dialog`. Hands the overlay to the next most
    /// recently activated overlay-bearing dialog when `dialog` owned it.
    pub fn forget(&self, dialog: &DialogHandle) {
        {
            let mut active = self.inner.active.borrow_mut();
            if active.as_ref().is_some_and(|w| w.points_to(dialog)) {
                *active = None;
            }
        }
        if dialog.has_class(class_name::OVERLAY_ACTIVE) {
            dialog.untag(class_name::OVERLAY_ACTIVE);
        }
        self.inner
            .overlays
            .borrow_mut()
            .retain(|w| !w.points_to(dialog));
        self.prune_overlays();

        if let Some(owner) = self.overlay_owner() {
            if !owner.has_class(class_name::OVERLAY_ACTIVE) {
                owner.tag(class_name::OVERLAY_ACTIVE);
            }
        }
    }

    fn prune_overlays(&self) {
        self.inner
            .overlays
            .borrow_mut()
            .retain(|w| w.upgrade().is_some_and(|d| !d.is_destroying()));
    }
}
