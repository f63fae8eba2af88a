#![forbid(unsafe_code)]

//! Facade for the dialog stack.
//!
//! Most hosts only need the [`prelude`]: build a [`DialogService`] over a
//! task queue, register an [`Anchor`], then open dialogs through the
//! builder.
//!
//! ```ignore
//! use dlg::prelude::*;
//!
//! let service = DialogService::new(queue);
//! service.register_anchor(anchor);
//!
//! let result = service
//!     .component(content)
//!     .title("Rename")
//!     .set_width("40%".parse::<Dimension>()?)
//!     .draggable(true)
//!     .open()
//!     .await?;
//! ```
//!
//! [`DialogService`]: dlg_stack::DialogService
//! [`Anchor`]: dlg_stack::Anchor

pub use dlg_core as core;
#[cfg(feature = "input")]
pub use dlg_input as input;
pub use dlg_stack as stack;

pub use dlg_core::{
    BoundBox, Configuration, ConfigurationEvent, ConfigurationSnapshot, Dimension,
    DimensionUnits, DialogPolicy, DialogSettings, Offset, Size,
};
pub use dlg_stack::{
    ActiveTracker, CloseOutcome, ClosingStatus, Completion, DialogCollection, DialogError,
    DialogHandle, DialogId, DialogService, ModalEvent, ModalEventType,
};

/// Everything a host needs to open and drive dialogs.
pub mod prelude {
    pub use dlg_core::{BoundBox, Dimension, DimensionUnits, DialogSettings, Offset, Size};
    pub use dlg_stack::{
        Anchor, CloseOutcome, ContentRef, DialogContent, DialogContext, DialogError,
        DialogHandle, DialogService, FocusTarget, ModalEvent, ModalEventType,
        PresentationSurface, Resolver, SurfaceRequest, TaskQueue, Verdict,
    };

    #[cfg(feature = "input")]
    pub use dlg_input::{DragController, KeyRouter, PointerEvent, ResizeController};
}
