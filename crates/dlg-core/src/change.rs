#![forbid(unsafe_code)]

//! Ordered change streams with weak subscribers and batched delivery.
//!
//! # Design
//!
//! [`ChangeStream<E>`] is a cloneable handle to a shared event queue.
//! Emitting pushes onto the queue and then flushes it unless delivery is
//! held. Delivery is held while a [`BatchScope`] is alive, and while the
//! stream is already dispatching. The latter turns events emitted from
//! inside a subscriber into follow-up deliveries instead of nested ones.
//!
//! Subscribers are stored as `Weak` callbacks. The returned [`Subscription`]
//! owns the strong side; dropping it unsubscribes.
//!
//! # Invariants
//!
//! 1. Every subscriber alive at delivery time sees every event, in emission
//!    order, and subscribers are called in registration order.
//! 2. A callback is never invoked while another callback of the same stream
//!    is running.
//! 3. Events emitted while a [`BatchScope`] is alive are delivered when the
//!    outermost scope drops.
//!
//! # Failure Modes
//!
//! - **Panicking subscriber**: the dispatch flag is reset by a drop guard, so
//!   the stream stays usable. Events still queued at the time of the panic
//!   are delivered on the next flush.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

struct StreamInner<E> {
    subscribers: RefCell<Vec<CallbackWeak<E>>>,
    pending: RefCell<VecDeque<E>>,
    /// Number of live batch scopes.
    held: Cell<usize>,
    dispatching: Cell<bool>,
    emitted: Cell<u64>,
}

/// A shared, ordered stream of change events.
///
/// Cloning a `ChangeStream` creates another handle to the same queue and
/// subscriber list.
pub struct ChangeStream<E> {
    inner: Rc<StreamInner<E>>,
}

impl<E> Clone for ChangeStream<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<E> fmt::Debug for ChangeStream<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeStream")
            .field("subscribers", &self.inner.subscribers.borrow().len())
            .field("pending", &self.inner.pending.borrow().len())
            .field("held", &self.inner.held.get())
            .field("emitted", &self.inner.emitted.get())
            .finish()
    }
}

impl<E: 'static> Default for ChangeStream<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: 'static> ChangeStream<E> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(StreamInner {
                subscribers: RefCell::new(Vec::new()),
                pending: RefCell::new(VecDeque::new()),
                held: Cell::new(0),
                dispatching: Cell::new(false),
                emitted: Cell::new(0),
            }),
        }
    }

    /// Register a callback for every subsequent event.
    ///
    /// The callback stays registered until the returned [`Subscription`]
    /// is dropped.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        let strong: CallbackRc<E> = Rc::new(callback);
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::downgrade(&strong));
        Subscription {
            _guard: Box::new(strong),
        }
    }

    /// Queue an event and deliver it unless delivery is currently held.
    pub fn emit(&self, event: E) {
        self.inner.pending.borrow_mut().push_back(event);
        self.inner.emitted.set(self.inner.emitted.get() + 1);
        self.flush();
    }

    /// Hold delivery until the returned scope (and any enclosing scope) drops.
    #[must_use = "dropping the scope immediately releases delivery"]
    pub fn batch(&self) -> BatchScope<E> {
        self.inner.held.set(self.inner.held.get() + 1);
        BatchScope {
            stream: self.clone(),
        }
    }

    /// Total number of events ever emitted on this stream.
    #[must_use]
    pub fn emitted(&self) -> u64 {
        self.inner.emitted.get()
    }

    /// Number of events waiting for delivery.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.pending.borrow().len()
    }

    /// Number of registered subscribers, including dead ones not yet pruned.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.borrow().len()
    }

    /// Whether both handles refer to the same stream.
    #[must_use]
    pub fn same_stream(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn flush(&self) {
        if self.inner.held.get() > 0 || self.inner.dispatching.get() {
            return;
        }
        self.inner.dispatching.set(true);
        let _reset = DispatchReset(&self.inner.dispatching);

        loop {
            let next = self.inner.pending.borrow_mut().pop_front();
            let Some(event) = next else { break };

            // Collect live callbacks first so no borrow is held during calls.
            let callbacks: Vec<CallbackRc<E>> = {
                let mut subscribers = self.inner.subscribers.borrow_mut();
                subscribers.retain(|w| w.strong_count() > 0);
                subscribers.iter().filter_map(Weak::upgrade).collect()
            };
            for callback in &callbacks {
                callback(&event);
            }
        }
    }
}

struct DispatchReset<'a>(&'a Cell<bool>);

impl Drop for DispatchReset<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// RAII guard deferring delivery on a [`ChangeStream`].
///
/// Scopes nest; only the outermost one flushes on drop.
pub struct BatchScope<E: 'static> {
    stream: ChangeStream<E>,
}

impl<E: 'static> Drop for BatchScope<E> {
    fn drop(&mut self) {
        let held = &self.stream.inner.held;
        held.set(held.get().saturating_sub(1));
        self.stream.flush();
    }
}

impl<E: 'static> fmt::Debug for BatchScope<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchScope")
            .field("held", &self.stream.inner.held.get())
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// Dropping the `Subscription` drops the strong side of the callback, so the
/// weak entry in the stream fails to upgrade on the next delivery.
pub struct Subscription {
    _guard: Box<dyn std::any::Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
