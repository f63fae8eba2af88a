//! Dialog content and the capability it receives.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::closing::ClosingStatus;
use crate::event::{DialogId, ModalEventType};
use crate::handle::{DialogHandle, WeakDialog};
use crate::hooks::{Resolution, Verdict};

/// Bound inputs: a flat JSON object.
pub type Params = Map<String, Value>;

/// User-supplied content hosted by a dialog.
///
/// Every method has a default, so plain content only implements what it
/// needs.
pub trait DialogContent {
    /// Receives the capability to close or retitle the hosting dialog.
    fn attach(&self, _context: DialogContext) {}

    fn bind_inputs(&self, _inputs: &DialogInputs) {}

    /// Class-level veto point, consulted before the builder's pre-close hook.
    fn pre_close(&self, _kind: ModalEventType) -> Verdict {
        Verdict::allow()
    }

    /// The hosting dialog became (or stopped being) the active dialog.
    fn activated(&self, _active: bool) {}
}

pub type ContentRef = Rc<dyn DialogContent>;

/// Supplies data merged into the content's inputs before the surface opens.
pub trait Resolver {
    fn resolve(&self, dialog: &DialogHandle) -> Resolution;
}

impl<F> Resolver for F
where
    F: Fn(&DialogHandle) -> Resolution,
{
    fn resolve(&self, dialog: &DialogHandle) -> Resolution {
        self(dialog)
    }
}

/// Inputs handed to content at open time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DialogInputs {
    pub title: Option<String>,
    pub params: Option<Value>,
    pub additional_params: Option<Value>,
    pub resolved: Option<Value>,
    /// Object keys of all three sources, merged.
    pub bound: Params,
}

impl DialogInputs {
    #[must_use]
    pub fn new(
        title: Option<String>,
        params: Option<Value>,
        additional_params: Option<Value>,
        resolved: Option<Value>,
    ) -> Self {
        let bound = merge_inputs(params.as_ref(), additional_params.as_ref(), resolved.as_ref());
        Self {
            title,
            params,
            additional_params,
            resolved,
            bound,
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.bound.get(key)
    }
}

/// Merge object sources with precedence `params` > `additional` > `resolved`.
///
/// Non-object sources contribute no keys.
#[must_use]
pub fn merge_inputs(
    params: Option<&Value>,
    additional: Option<&Value>,
    resolved: Option<&Value>,
) -> Params {
    let mut bound = Params::new();
    for source in [resolved, additional, params].into_iter().flatten() {
        if let Value::Object(map) = source {
            for (key, value) in map {
                bound.insert(key.clone(), value.clone());
            }
        }
    }
    bound
}

/// Capability handed to content: close, retitle, query activity.
///
/// Holds the dialog weakly; once the dialog is gone every operation is a
/// no-op and close attempts report [`DialogError::Detached`](crate::DialogError::Detached).
#[derive(Clone)]
pub struct DialogContext {
    dialog: WeakDialog,
    id: DialogId,
}

impl fmt::Debug for DialogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogContext")
            .field("id", &self.id)
            .field("alive", &self.dialog.is_alive())
            .finish()
    }
}

impl DialogContext {
    pub(crate) fn new(dialog: &DialogHandle) -> Self {
        Self {
            dialog: dialog.downgrade(),
            id: dialog.id(),
        }
    }

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.id
    }

    #[must_use]
    pub fn dialog(&self) -> Option<DialogHandle> {
        self.dialog.upgrade()
    }

    pub fn confirm(&self, data: impl Into<Option<Value>>) -> ClosingStatus {
        match self.dialog() {
            Some(dialog) => dialog.confirm(data),
            None => ClosingStatus::detached(self.id),
        }
    }

    pub fn cancel(&self) -> ClosingStatus {
        match self.dialog() {
            Some(dialog) => dialog.cancel(),
            None => ClosingStatus::detached(self.id),
        }
    }

    pub fn close(&self, data: Option<Value>, kind: ModalEventType) -> ClosingStatus {
        match self.dialog() {
            Some(dialog) => dialog.close(data, kind),
            None => ClosingStatus::detached(self.id),
        }
    }

    pub fn set_title(&self, title: impl Into<String>) {
        if let Some(dialog) = self.dialog() {
            dialog.set_title(title);
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.dialog().is_some_and(|d| d.is_active())
    }
}
