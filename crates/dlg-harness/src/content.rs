//! Programmable dialog content.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use dlg_stack::{
    ContentRef, DialogContent, DialogContext, DialogInputs, HookError, ModalEventType, Verdict,
};

type PreCloseScript = Box<dyn Fn(ModalEventType) -> Verdict>;

/// Content whose pre-close answer is scripted and whose inputs, context and
/// activation changes are recorded.
pub struct ScriptedContent {
    pre_close: RefCell<PreCloseScript>,
    pre_close_calls: RefCell<Vec<ModalEventType>>,
    context: RefCell<Option<DialogContext>>,
    inputs: RefCell<Option<DialogInputs>>,
    activations: RefCell<Vec<bool>>,
    attached: Cell<usize>,
}

impl fmt::Debug for ScriptedContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedContent")
            .field("pre_close_calls", &self.pre_close_calls.borrow())
            .field("activations", &self.activations.borrow())
            .field("attached", &self.attached.get())
            .finish_non_exhaustive()
    }
}

impl Default for ScriptedContent {
    fn default() -> Self {
        Self {
            pre_close: RefCell::new(Box::new(|_| Verdict::allow())),
            pre_close_calls: RefCell::new(Vec::new()),
            context: RefCell::new(None),
            inputs: RefCell::new(None),
            activations: RefCell::new(Vec::new()),
            attached: Cell::new(0),
        }
    }
}

impl ScriptedContent {
    /// Content that always allows closing.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Content that vetoes every close.
    #[must_use]
    pub fn denying() -> Rc<Self> {
        let content = Self::new();
        content.script_pre_close(|_| Verdict::deny());
        content
    }

    /// Content whose pre-close hook fails with `message`.
    #[must_use]
    pub fn failing(message: &str) -> Rc<Self> {
        let content = Self::new();
        let message = message.to_owned();
        content.script_pre_close(move |_| Verdict::fail(HookError::new(message.clone())));
        content
    }

    /// Replace the pre-close answer.
    pub fn script_pre_close(&self, script: impl Fn(ModalEventType) -> Verdict + 'static) {
        *self.pre_close.borrow_mut() = Box::new(script);
    }

    /// As a trait object for `component()`.
    #[must_use]
    pub fn as_content(self: &Rc<Self>) -> ContentRef {
        Rc::clone(self) as ContentRef
    }

    #[must_use]
    pub fn pre_close_calls(&self) -> Vec<ModalEventType> {
        self.pre_close_calls.borrow().clone()
    }

    /// The capability received on attach.
    #[must_use]
    pub fn context(&self) -> Option<DialogContext> {
        self.context.borrow().clone()
    }

    #[must_use]
    pub fn inputs(&self) -> Option<DialogInputs> {
        self.inputs.borrow().clone()
    }

    #[must_use]
    pub fn activations(&self) -> Vec<bool> {
        self.activations.borrow().clone()
    }

    #[must_use]
    pub fn attach_count(&self) -> usize {
        self.attached.get()
    }
}

impl DialogContent for ScriptedContent {
    fn attach(&self, context: DialogContext) {
        self.attached.set(self.attached.get() + 1);
        *self.context.borrow_mut() = Some(context);
    }

    fn bind_inputs(&self, inputs: &DialogInputs) {
        *self.inputs.borrow_mut() = Some(inputs.clone());
    }

    fn pre_close(&self, kind: ModalEventType) -> Verdict {
        self.pre_close_calls.borrow_mut().push(kind);
        (self.pre_close.borrow())(kind)
    }

    fn activated(&self, active: bool) {
        self.activations.borrow_mut().push(active);
    }
}
