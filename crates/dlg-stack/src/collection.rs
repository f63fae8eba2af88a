#![forbid(unsafe_code)]

//! Ordered registry of the dialogs mounted on one anchor.
//!
//! The collection owns its dialogs (strong handles, creation order) and
//! keeps each dialog's `previous` link pointing at the dialog created just
//! before it. Removing a middle dialog re-links its successor, so the chain
//! `A <- B <- C <- D` becomes `A <- B <- D` when `C` goes away.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use dlg_core::{BoundBox, ChangeStream, DialogSettings, Subscription};
use futures::future::{self, Ready};
use tracing::{debug, trace};

use crate::content::Resolver;
use crate::event::{CollectionEvent, DialogId};
use crate::handle::{
    DestroyHook, DialogHandle, DialogSeed, LifecycleHooks, TaskQueue, ViewReadyHook,
};
use crate::surface::Anchor;
use crate::tracker::ActiveTracker;

struct CollectionInner {
    dialogs: RefCell<Vec<DialogHandle>>,
    next_id: Cell<u64>,
    events: ChangeStream<CollectionEvent>,
    tracker: ActiveTracker,
    queue: TaskQueue,
    settings: Rc<DialogSettings>,
    anchor: RefCell<Option<Rc<dyn Anchor>>>,
}

/// Dialogs of one anchor, oldest first.
#[derive(Clone)]
pub struct DialogCollection {
    inner: Rc<CollectionInner>,
}

/// Non-owning reference held by dialogs.
#[derive(Clone, Default)]
pub(crate) struct WeakCollection {
    inner: Weak<CollectionInner>,
}

impl WeakCollection {
    pub(crate) fn upgrade(&self) -> Option<DialogCollection> {
        self.inner.upgrade().map(|inner| DialogCollection { inner })
    }
}

impl fmt::Debug for DialogCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogCollection")
            .field("dialogs", &self.ids())
            .field("anchored", &self.has_anchor())
            .finish_non_exhaustive()
    }
}

impl DialogCollection {
    #[must_use]
    pub fn new(tracker: ActiveTracker, queue: TaskQueue, settings: Rc<DialogSettings>) -> Self {
        Self {
            inner: Rc::new(CollectionInner {
                dialogs: RefCell::new(Vec::new()),
                next_id: Cell::new(1),
                events: ChangeStream::new(),
                tracker,
                queue,
                settings,
                anchor: RefCell::new(None),
            }),
        }
    }

    fn downgrade(&self) -> WeakCollection {
        WeakCollection {
            inner: Rc::downgrade(&self.inner),
        }
    }

    // -- anchor --------------------------------------------------------------

    pub fn register_anchor(&self, anchor: Rc<dyn Anchor>) {
        *self.inner.anchor.borrow_mut() = Some(anchor);
    }

    #[must_use]
    pub fn anchor(&self) -> Option<Rc<dyn Anchor>> {
        self.inner.anchor.borrow().clone()
    }

    #[must_use]
    pub fn has_anchor(&self) -> bool {
        self.inner.anchor.borrow().is_some()
    }

    #[must_use]
    pub fn tracker(&self) -> &ActiveTracker {
        &self.inner.tracker
    }

    #[must_use]
    pub fn settings(&self) -> &DialogSettings {
        &self.inner.settings
    }

    pub(crate) fn shared_settings(&self) -> Rc<DialogSettings> {
        Rc::clone(&self.inner.settings)
    }

    pub(crate) fn queue(&self) -> TaskQueue {
        Rc::clone(&self.inner.queue)
    }

    // -- registration --------------------------------------------------------

    /// Create a dialog and register it.
    ///
    /// Id, `previous` link and initial stack order are assigned here, before
    /// any awaiting, so rapid successive opens stay in creation order.
    #[must_use]
    pub fn create(&self, resolver: Option<Rc<dyn Resolver>>) -> DialogHandle {
        let id = DialogId::new(self.inner.next_id.get());
        self.inner.next_id.set(id.get() + 1);
        let previous = self.last().map(|d| d.downgrade());
        let viewport = self.anchor().map_or(BoundBox::UNBOUNDED, |a| a.viewport());

        let dialog = DialogHandle::new(DialogSeed {
            id,
            settings: Rc::clone(&self.inner.settings),
            tracker: self.inner.tracker.clone(),
            queue: Rc::clone(&self.inner.queue),
            collection: self.downgrade(),
            resolver,
            previous,
            viewport,
        });
        self.add(&dialog);
        dialog
    }

    /// Install lifecycle hooks and append.
    pub fn add(&self, dialog: &DialogHandle) {
        let view_ready: ViewReadyHook = {
            let collection = self.downgrade();
            Rc::new(move |dialog: &DialogHandle| {
                if let Some(collection) = collection.upgrade() {
                    collection.inner.events.emit(CollectionEvent::Open(dialog.id()));
                }
            })
        };
        let destroy: DestroyHook = {
            let collection = self.downgrade();
            Rc::new(move |dialog: &DialogHandle, force: bool| {
                if let Some(collection) = collection.upgrade() {
                    collection.dialog_destroyed(dialog, force);
                }
            })
        };
        dialog.install_hooks(LifecycleHooks {
            view_ready: Some(view_ready),
            destroy: Some(destroy),
        });

        let len = self.len();
        let base = dialog
            .order()
            .unwrap_or_else(|| dialog.policy().default_z_index);
        dialog.assign_order(base.saturating_add(u32::try_from(len).unwrap_or(u32::MAX)));
        self.inner.dialogs.borrow_mut().push(dialog.clone());
        trace!(id = dialog.id().get(), len = len + 1, "collection.add");
    }

    fn dialog_destroyed(&self, dialog: &DialogHandle, force: bool) {
        let tracker = &self.inner.tracker;
        if tracker.is_active(dialog) {
            match dialog.previous().filter(|_| !force) {
                Some(previous) => tracker.set(&previous),
                None => tracker.clear(),
            }
        }
        // Drops overlay ownership and any stale active entry.
        tracker.forget(dialog);

        let id = dialog.id();
        if self.remove(dialog) {
            self.inner.events.emit(CollectionEvent::Close(id));
        }
    }

    /// Splice `dialog` out, repairing the successor's `previous` link.
    ///
    /// Returns `false` when the dialog was not a member.
    pub fn remove(&self, dialog: &DialogHandle) -> bool {
        let removed = {
            let mut dialogs = self.inner.dialogs.borrow_mut();
            let Some(index) = dialogs.iter().position(|d| d.ptr_eq(dialog)) else {
                return false;
            };
            if let Some(next) = dialogs.get(index + 1) {
                next.relink_previous(dialog.previous_link());
            }
            dialogs.remove(index)
        };
        removed.clear_hooks();
        debug!(id = removed.id().get(), "collection.remove");
        true
    }

    // -- sweeps --------------------------------------------------------------

    /// Destroy every dialog not flagged `close_only_by_user`, newest first.
    pub fn close_all(&self) -> Ready<()> {
        for dialog in self.dialogs().into_iter().rev() {
            if !dialog.is_close_only_by_user() {
                dialog.destroy(false);
            }
        }
        future::ready(())
    }

    /// Force-destroy everything, always from the tail, until empty.
    pub fn destroy_all(&self) -> Ready<()> {
        while let Some(dialog) = self.last() {
            dialog.destroy(true);
            // Already-destroying dialogs are no-ops above; drop them here.
            self.remove(&dialog);
        }
        future::ready(())
    }

    /// Forward a viewport change to every dialog.
    pub fn viewport_resized(&self, viewport: BoundBox) {
        for dialog in self.dialogs() {
            dialog.viewport_resized(viewport);
        }
    }

    // -- queries -------------------------------------------------------------

    /// The tracker's active dialog, not a local scan.
    #[must_use]
    pub fn active(&self) -> Option<DialogHandle> {
        self.inner.tracker.get()
    }

    #[must_use]
    pub fn first(&self) -> Option<DialogHandle> {
        self.inner.dialogs.borrow().first().cloned()
    }

    #[must_use]
    pub fn last(&self) -> Option<DialogHandle> {
        self.inner.dialogs.borrow().last().cloned()
    }

    #[must_use]
    pub fn get_by_id(&self, id: DialogId) -> Option<DialogHandle> {
        self.inner.dialogs.borrow().iter().find(|d| d.id() == id).cloned()
    }

    #[must_use]
    pub fn contains(&self, dialog: &DialogHandle) -> bool {
        self.inner.dialogs.borrow().iter().any(|d| d.ptr_eq(dialog))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.dialogs.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.dialogs.borrow().is_empty()
    }

    /// Snapshot of the members, oldest first.
    #[must_use]
    pub fn dialogs(&self) -> Vec<DialogHandle> {
        self.inner.dialogs.borrow().clone()
    }

    #[must_use]
    pub fn ids(&self) -> Vec<DialogId> {
        self.inner.dialogs.borrow().iter().map(DialogHandle::id).collect()
    }

    pub fn subscribe(&self, callback: impl Fn(&CollectionEvent) + 'static) -> Subscription {
        self.inner.events.subscribe(callback)
    }
}
