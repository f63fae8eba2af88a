#![forbid(unsafe_code)]

//! Dialog lifecycle and stacking.
//!
//! - [`DialogService`]: entry point. Builder calls create a [`DialogHandle`]
//!   on the service's resolved [`DialogCollection`].
//! - [`DialogHandle`]: fluent builder plus the async open/close protocol.
//! - [`DialogCollection`]: ordered registry for one [`Anchor`], maintaining
//!   the `previous` chain.
//! - [`ActiveTracker`]: which dialog is active, which owns the overlay, and
//!   the stack order counter.
//!
//! Everything here is single-threaded. Protocol work runs on a
//! [`TaskQueue`] (any [`futures::task::LocalSpawn`]), and hooks may answer
//! synchronously, with a future, or with a stream (see [`hooks`]).
//!
//! # Example
//!
//! ```rust,ignore
//! let mut pool = futures::executor::LocalPool::new();
//! let service = DialogService::new(Rc::new(pool.spawner()));
//! service.register_anchor(anchor);
//!
//! let completion = service
//!     .component(content)
//!     .set_dimensions(300.0, 400.0)
//!     .open();
//! let event = pool.run_until(completion)?;
//! ```

pub mod closing;
pub mod collection;
pub mod content;
pub mod error;
pub mod event;
pub mod handle;
pub mod hooks;
pub mod service;
pub mod surface;
pub mod tracker;

pub use closing::{ClosingStatus, Completion};
pub use collection::DialogCollection;
pub use content::{
    ContentRef, DialogContent, DialogContext, DialogInputs, Params, Resolver, merge_inputs,
};
pub use error::{DialogError, FocusError, HookError, Result};
pub use event::{CloseOutcome, CollectionEvent, DialogId, ModalEvent, ModalEventType};
pub use handle::{DialogHandle, TaskQueue, WeakDialog};
pub use hooks::{Resolution, Verdict};
pub use service::DialogService;
pub use surface::{Anchor, FocusTarget, PresentationSurface, SurfaceRequest};
pub use tracker::ActiveTracker;
