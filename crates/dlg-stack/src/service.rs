#![forbid(unsafe_code)]

//! Application-facing entry point.
//!
//! Every [`DialogService`] owns a [`DialogCollection`]. Until an anchor is
//! registered on a service, builder calls borrow the collection of the
//! nearest ancestor that has one. The lookup result is cached and only
//! reset when an anchor is registered on this service.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use dlg_core::{BoundBox, DialogSettings, Subscription};
use futures::future::Ready;
use serde_json::Value;
use tracing::debug;

use crate::collection::DialogCollection;
use crate::content::{ContentRef, Resolver};
use crate::error::HookError;
use crate::event::{CollectionEvent, DialogId};
use crate::handle::{DialogHandle, TaskQueue};
use crate::surface::Anchor;
use crate::tracker::ActiveTracker;

struct ServiceInner {
    own: DialogCollection,
    parent: Option<DialogService>,
    resolved: RefCell<Option<DialogCollection>>,
    resolver: RefCell<Option<Rc<dyn Resolver>>>,
}

/// Dialog entry point with parent delegation.
#[derive(Clone)]
pub struct DialogService {
    inner: Rc<ServiceInner>,
}

impl fmt::Debug for DialogService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogService")
            .field("collection", &self.inner.own)
            .field("has_parent", &self.inner.parent.is_some())
            .finish_non_exhaustive()
    }
}

impl DialogService {
    /// Root service on the thread-wide tracker with default settings.
    #[must_use]
    pub fn new(queue: TaskQueue) -> Self {
        Self::with_tracker(ActiveTracker::global(), queue, DialogSettings::default())
    }

    #[must_use]
    pub fn with_tracker(tracker: ActiveTracker, queue: TaskQueue, settings: DialogSettings) -> Self {
        Self::from_parts(
            DialogCollection::new(tracker, queue, Rc::new(settings)),
            None,
        )
    }

    fn from_parts(own: DialogCollection, parent: Option<DialogService>) -> Self {
        Self {
            inner: Rc::new(ServiceInner {
                own,
                parent,
                resolved: RefCell::new(None),
                resolver: RefCell::new(None),
            }),
        }
    }

    /// A nested service sharing tracker, queue and settings.
    ///
    /// Until it gets its own anchor, dialogs go to the parent's collection.
    #[must_use]
    pub fn child(&self) -> Self {
        let own = &self.inner.own;
        let collection = DialogCollection::new(
            own.tracker().clone(),
            own.queue(),
            own.shared_settings(),
        );
        let child = Self::from_parts(collection, Some(self.clone()));
        if let Some(resolver) = self.inner.resolver.borrow().clone() {
            child.set_resolver(resolver);
        }
        child
    }

    pub fn set_resolver(&self, resolver: Rc<dyn Resolver>) {
        *self.inner.resolver.borrow_mut() = Some(resolver);
    }

    pub fn register_anchor(&self, anchor: Rc<dyn Anchor>) {
        self.inner.own.register_anchor(anchor);
        *self.inner.resolved.borrow_mut() = Some(self.inner.own.clone());
        debug!("service.anchor_registered");
    }

    /// Collection builder calls target.
    ///
    /// The first anchored collection up the parent chain; this service's
    /// own collection when none is anchored. Cached once an anchored one is
    /// found.
    #[must_use]
    pub fn collection(&self) -> DialogCollection {
        if let Some(cached) = self.inner.resolved.borrow().clone() {
            return cached;
        }
        match self.anchored_collection() {
            Some(found) => {
                *self.inner.resolved.borrow_mut() = Some(found.clone());
                found
            }
            None => self.inner.own.clone(),
        }
    }

    fn anchored_collection(&self) -> Option<DialogCollection> {
        if self.inner.own.has_anchor() {
            return Some(self.inner.own.clone());
        }
        self.inner
            .parent
            .as_ref()
            .and_then(DialogService::anchored_collection)
    }

    // -- builder entry -------------------------------------------------------

    /// A fresh dialog registered on the resolved collection.
    #[must_use]
    pub fn dialog(&self) -> DialogHandle {
        let resolver = self.inner.resolver.borrow().clone();
        self.collection().create(resolver)
    }

    #[must_use]
    pub fn title(&self, title: impl Into<String>) -> DialogHandle {
        self.dialog().title(title)
    }

    #[must_use]
    pub fn params(&self, params: Value) -> DialogHandle {
        self.dialog().params(params)
    }

    #[must_use]
    pub fn component(&self, content: ContentRef) -> DialogHandle {
        self.dialog().component(content)
    }

    #[must_use]
    pub fn load_component<F, Fut>(&self, loader: F) -> DialogHandle
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<ContentRef, HookError>> + 'static,
    {
        self.dialog().load_component(loader)
    }

    // -- collection passthrough ----------------------------------------------

    pub fn close_all(&self) -> Ready<()> {
        self.collection().close_all()
    }

    pub fn destroy_all(&self) -> Ready<()> {
        self.collection().destroy_all()
    }

    #[must_use]
    pub fn active(&self) -> Option<DialogHandle> {
        self.collection().active()
    }

    #[must_use]
    pub fn first(&self) -> Option<DialogHandle> {
        self.collection().first()
    }

    #[must_use]
    pub fn last(&self) -> Option<DialogHandle> {
        self.collection().last()
    }

    #[must_use]
    pub fn get_by_id(&self, id: DialogId) -> Option<DialogHandle> {
        self.collection().get_by_id(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.collection().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collection().is_empty()
    }

    #[must_use]
    pub fn dialogs(&self) -> Vec<DialogHandle> {
        self.collection().dialogs()
    }

    /// Notified with the dialog id once its surface is view-ready.
    pub fn subscribe_open(&self, callback: impl Fn(DialogId) + 'static) -> Subscription {
        self.collection().subscribe(move |event| {
            if let CollectionEvent::Open(id) = event {
                callback(*id);
            }
        })
    }

    /// Notified with the dialog id once it is removed.
    pub fn subscribe_close(&self, callback: impl Fn(DialogId) + 'static) -> Subscription {
        self.collection().subscribe(move |event| {
            if let CollectionEvent::Close(id) = event {
                callback(*id);
            }
        })
    }

    pub fn viewport_resized(&self, viewport: BoundBox) {
        self.collection().viewport_resized(viewport);
    }

    #[must_use]
    pub fn tracker(&self) -> ActiveTracker {
        self.inner.own.tracker().clone()
    }
}
