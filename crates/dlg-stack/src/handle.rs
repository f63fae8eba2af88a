#![forbid(unsafe_code)]

//! Dialog handle: fluent builder plus the open/close protocol.
//!
//! # Design
//!
//! A [`DialogHandle`] is a cheap `Rc` handle. Builder methods take `self`
//! and return it so they chain off the service entry points:
//!
//! ```rust,ignore
//! let done = service
//!     .component(content)
//!     .title("Rename")
//!     .set_width(400.0)
//!     .draggable(true)
//!     .open();
//! ```
//!
//! `open()`, `cancel()`, `confirm()` and `close()` spawn their protocol on
//! the service's task queue and return awaitable handles, so the work
//! proceeds whether or not anyone polls the result.
//!
//! # Invariants
//!
//! 1. The completion settles at most once.
//! 2. Close stages run strictly in order: content `pre_close`, builder
//!    `pre_close`, then settle and destroy.
//! 3. `destroy` runs once; later calls are no-ops.
//! 4. No `RefCell` borrow of the handle's state is held while user code,
//!    the surface, or the tracker runs.
//!
//! # Failure Modes
//!
//! - **Hook never settles**: `open()` (or the close attempt) stays pending.
//!   No timeout is imposed.
//! - **Destroyed while opening**: the completion resolves to
//!   [`DialogError::Cancelled`] and the surface is never created.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};

use dlg_core::{
    BoundBox, Configuration, ConfigurationEvent, ConfigurationSnapshot, DialogPolicy,
    DialogSettings, Dimension, Offset, SharedConfiguration, Size, Subscription, class_name,
};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::{LocalSpawn, LocalSpawnExt};
use serde_json::Value;
use tracing::{Instrument, debug, debug_span, trace, warn};

use crate::closing::{ClosingStatus, Completion, CompletionSender};
use crate::collection::{DialogCollection, WeakCollection};
use crate::content::{ContentRef, DialogContext, DialogInputs, Resolver};
use crate::error::{DialogError, HookError};
use crate::event::{CloseOutcome, DialogId, ModalEvent, ModalEventType};
use crate::hooks::Verdict;
use crate::surface::{FocusTarget, PresentationSurface, SurfaceRequest};
use crate::tracker::ActiveTracker;

/// Executor the protocol runs on.
pub type TaskQueue = Rc<dyn LocalSpawn>;

type ContentLoader = Box<dyn FnOnce() -> LocalBoxFuture<'static, Result<ContentRef, HookError>>>;
type PreOpenHook = Box<dyn FnOnce() -> Verdict>;
type PreCloseHook = Rc<dyn Fn(&ModalEvent) -> Verdict>;
type AfterViewInit = Box<dyn FnOnce(&DialogHandle)>;

pub(crate) type ViewReadyHook = Rc<dyn Fn(&DialogHandle)>;
pub(crate) type DestroyHook = Rc<dyn Fn(&DialogHandle, bool)>;

/// Callbacks a collection installs on the dialogs it owns.
#[derive(Default)]
pub(crate) struct LifecycleHooks {
    pub(crate) view_ready: Option<ViewReadyHook>,
    pub(crate) destroy: Option<DestroyHook>,
}

/// Construction parameters supplied by the owning collection.
pub(crate) struct DialogSeed {
    pub(crate) id: DialogId,
    pub(crate) settings: Rc<DialogSettings>,
    pub(crate) tracker: ActiveTracker,
    pub(crate) queue: TaskQueue,
    pub(crate) collection: WeakCollection,
    pub(crate) resolver: Option<Rc<dyn Resolver>>,
    pub(crate) previous: Option<WeakDialog>,
    pub(crate) viewport: BoundBox,
}

#[derive(Default)]
struct DialogState {
    title: Option<String>,
    params: Option<Value>,
    additional_params: Option<Value>,
    resolved: Option<Value>,
    content: Option<ContentRef>,
    loader: Option<ContentLoader>,
    pre_open: Option<PreOpenHook>,
    pre_close: Option<PreCloseHook>,
    after_view_init: Option<AfterViewInit>,
    previous: Option<WeakDialog>,
    surface: Option<Rc<dyn PresentationSurface>>,
    focus_target: Option<Rc<dyn FocusTarget>>,
    completion: Option<CompletionSender>,
    settled: bool,
    subscriptions: Vec<Subscription>,
}

struct DialogInner {
    id: DialogId,
    config: SharedConfiguration,
    settings: Rc<DialogSettings>,
    tracker: ActiveTracker,
    queue: TaskQueue,
    collection: WeakCollection,
    resolver: Option<Rc<dyn Resolver>>,
    state: RefCell<DialogState>,
    hooks: RefCell<LifecycleHooks>,
    opened: Cell<bool>,
    view_ready: Cell<bool>,
    destroying: Cell<bool>,
    close_only_by_user: Cell<bool>,
    close_on_error: Cell<bool>,
}

/// One dialog: builder, state owner and protocol driver.
#[derive(Clone)]
pub struct DialogHandle {
    inner: Rc<DialogInner>,
}

/// Non-owning reference to a dialog.
#[derive(Clone)]
pub struct WeakDialog {
    inner: Weak<DialogInner>,
}

impl WeakDialog {
    #[must_use]
    pub fn upgrade(&self) -> Option<DialogHandle> {
        self.inner.upgrade().map(|inner| DialogHandle { inner })
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    /// Identity comparison without upgrading.
    #[must_use]
    pub fn points_to(&self, dialog: &DialogHandle) -> bool {
        std::ptr::eq(self.inner.as_ptr(), Rc::as_ptr(&dialog.inner))
    }
}

impl fmt::Debug for WeakDialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(dialog) => write!(f, "WeakDialog({})", dialog.id()),
            None => f.write_str("WeakDialog(<dropped>)"),
        }
    }
}

impl fmt::Debug for DialogHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialogHandle")
            .field("id", &self.inner.id)
            .field("opened", &self.inner.opened.get())
            .field("destroying", &self.inner.destroying.get())
            .field("order", &self.order())
            .finish_non_exhaustive()
    }
}

impl PartialEq for DialogHandle {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for DialogHandle {}

impl DialogHandle {
    pub(crate) fn new(seed: DialogSeed) -> Self {
        let mut config = Configuration::new(seed.settings.policy);
        config.set_viewport(seed.viewport);
        let state = DialogState {
            previous: seed.previous,
            ..DialogState::default()
        };
        Self {
            inner: Rc::new(DialogInner {
                id: seed.id,
                config: SharedConfiguration::new(config),
                settings: seed.settings,
                tracker: seed.tracker,
                queue: seed.queue,
                collection: seed.collection,
                resolver: seed.resolver,
                state: RefCell::new(state),
                hooks: RefCell::new(LifecycleHooks::default()),
                opened: Cell::new(false),
                view_ready: Cell::new(false),
                destroying: Cell::new(false),
                close_only_by_user: Cell::new(false),
                close_on_error: Cell::new(false),
            }),
        }
    }

    // -- identity ------------------------------------------------------------

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.inner.id
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDialog {
        WeakDialog {
            inner: Rc::downgrade(&self.inner),
        }
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// The dialog opened immediately before this one, if still live.
    #[must_use]
    pub fn previous(&self) -> Option<DialogHandle> {
        self.inner
            .state
            .borrow()
            .previous
            .as_ref()
            .and_then(WeakDialog::upgrade)
            .filter(|d| !d.is_destroying())
    }

    pub(crate) fn previous_link(&self) -> Option<WeakDialog> {
        self.inner.state.borrow().previous.clone()
    }

    pub(crate) fn relink_previous(&self, previous: Option<WeakDialog>) {
        self.inner.state.borrow_mut().previous = previous;
    }

    // -- builder -------------------------------------------------------------

    #[must_use]
    pub fn title(self, title: impl Into<String>) -> Self {
        self.inner.state.borrow_mut().title = Some(title.into());
        self
    }

    #[must_use]
    pub fn params(self, params: Value) -> Self {
        self.inner.state.borrow_mut().params = Some(params);
        self
    }

    #[must_use]
    pub fn additional_params(self, params: Value) -> Self {
        self.inner.state.borrow_mut().additional_params = Some(params);
        self
    }

    #[must_use]
    pub fn component(self, content: ContentRef) -> Self {
        self.inner.state.borrow_mut().content = Some(content);
        self
    }

    /// Content resolved lazily on `open()`.
    #[must_use]
    pub fn load_component<F, Fut>(self, loader: F) -> Self
    where
        F: FnOnce() -> Fut + 'static,
        Fut: Future<Output = Result<ContentRef, HookError>> + 'static,
    {
        self.inner.state.borrow_mut().loader = Some(Box::new(move || loader().boxed_local()));
        self
    }

    #[must_use]
    pub fn set_height(self, height: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_height(Some(height.into()), true));
        self
    }

    #[must_use]
    pub fn set_min_height(self, height: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_min_height(Some(height.into()), true));
        self
    }

    #[must_use]
    pub fn set_max_height(self, height: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_max_height(Some(height.into()), true));
        self
    }

    #[must_use]
    pub fn set_width(self, width: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_width(Some(width.into()), true));
        self
    }

    #[must_use]
    pub fn set_min_width(self, width: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_min_width(Some(width.into()), true));
        self
    }

    #[must_use]
    pub fn set_max_width(self, width: impl Into<Dimension>) -> Self {
        self.configure(|c| c.set_max_width(Some(width.into()), true));
        self
    }

    #[must_use]
    pub fn set_dimensions(self, height: impl Into<Dimension>, width: impl Into<Dimension>) -> Self {
        self.set_height(height).set_width(width)
    }

    #[must_use]
    pub fn set_full_screen(self, full_screen: bool) -> Self {
        self.configure(|c| c.set_maximized(full_screen));
        self
    }

    #[must_use]
    pub fn offset_left(self, left: f64) -> Self {
        self.configure(|c| c.set_left_position(left));
        self
    }

    #[must_use]
    pub fn offset_top(self, top: f64) -> Self {
        self.configure(|c| c.set_top_position(top));
        self
    }

    /// Ignored while maximized.
    #[must_use]
    pub fn draggable(self, enabled: bool) -> Self {
        self.configure(|c| {
            if !c.is_maximized() {
                c.set_draggable(enabled, true);
            }
        });
        self
    }

    /// Ignored while maximized.
    #[must_use]
    pub fn resizable(self, enabled: bool) -> Self {
        self.configure(|c| {
            if !c.is_maximized() {
                c.set_resizable(enabled, true);
            }
        });
        self
    }

    #[must_use]
    pub fn overlay(self, visible: bool) -> Self {
        self.configure(|c| c.set_overlay_visible(visible));
        self
    }

    #[must_use]
    pub fn visible(self, visible: bool) -> Self {
        self.configure(|c| c.set_visible(visible));
        self
    }

    #[must_use]
    pub fn show_close(self, visible: bool) -> Self {
        self.configure(|c| c.set_close_button_visible(visible));
        self
    }

    #[must_use]
    pub fn show_maximize(self, visible: bool) -> Self {
        self.configure(|c| c.set_maximize_button_visible(visible));
        self
    }

    #[must_use]
    pub fn show_collapse(self, visible: bool) -> Self {
        self.configure(|c| c.set_collapse_button_visible(visible));
        self
    }

    #[must_use]
    pub fn close_on_esc(self, enabled: bool) -> Self {
        self.configure(|c| c.set_close_on_esc(enabled));
        self
    }

    #[must_use]
    pub fn close_on_click(self) -> Self {
        self.configure(|c| c.set_close_on_document_click(true));
        self
    }

    /// Force-close with `Cancel` when a pre-close hook fails.
    #[must_use]
    pub fn close_on_error(self) -> Self {
        self.inner.close_on_error.set(true);
        self
    }

    /// Exempt from `close_all`.
    #[must_use]
    pub fn close_only_by_user(self) -> Self {
        self.inner.close_only_by_user.set(true);
        self
    }

    #[must_use]
    pub fn preserve_desktop_behavior(self, preserved: bool) -> Self {
        self.configure(|c| c.set_desktop_behavior_preserved(preserved));
        self
    }

    #[must_use]
    pub fn position_on_screen_center(self, center: bool) -> Self {
        self.configure(|c| c.set_position_to_screen_center(center));
        self
    }

    #[must_use]
    pub fn set_order(self, order: u32) -> Self {
        self.assign_order(order);
        self
    }

    #[must_use]
    pub fn add_class(self, name: &str) -> Self {
        self.tag(name);
        self
    }

    #[must_use]
    pub fn remove_class(self, name: &str) -> Self {
        self.untag(name);
        self
    }

    #[must_use]
    pub fn pre_open<F, V>(self, hook: F) -> Self
    where
        F: FnOnce() -> V + 'static,
        V: Into<Verdict>,
    {
        self.inner.state.borrow_mut().pre_open = Some(Box::new(move || hook().into()));
        self
    }

    #[must_use]
    pub fn pre_close<F, V>(self, hook: F) -> Self
    where
        F: Fn(&ModalEvent) -> V + 'static,
        V: Into<Verdict>,
    {
        let hook: PreCloseHook = Rc::new(move |event: &ModalEvent| hook(event).into());
        self.inner.state.borrow_mut().pre_close = Some(hook);
        self
    }

    /// Runs once, right after the surface reports view-ready.
    #[must_use]
    pub fn after_view_init(self, hook: impl FnOnce(&DialogHandle) + 'static) -> Self {
        self.inner.state.borrow_mut().after_view_init = Some(Box::new(hook));
        self
    }

    /// Element to refocus when this dialog closes without a previous dialog.
    #[must_use]
    pub fn focus_on_close(self, target: Rc<dyn FocusTarget>) -> Self {
        self.inner.state.borrow_mut().focus_target = Some(target);
        self
    }

    // -- configuration access ------------------------------------------------

    /// Mutate the configuration; events are delivered after `f` returns.
    pub fn configure<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        self.inner.config.update(f)
    }

    #[must_use]
    pub fn configuration(&self) -> &SharedConfiguration {
        &self.inner.config
    }

    #[must_use]
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        self.inner.config.snapshot()
    }

    #[must_use]
    pub fn policy(&self) -> DialogPolicy {
        self.inner.settings.policy
    }

    #[must_use]
    pub fn settings(&self) -> &DialogSettings {
        &self.inner.settings
    }

    #[must_use]
    pub fn order(&self) -> Option<u32> {
        self.inner.config.read(Configuration::order)
    }

    pub(crate) fn assign_order(&self, order: u32) {
        self.configure(|c| c.set_order(order));
    }

    pub(crate) fn tag(&self, name: &str) {
        self.configure(|c| c.add_class(name));
    }

    pub(crate) fn untag(&self, name: &str) {
        self.configure(|c| c.remove_class(name));
    }

    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.inner.config.read(|c| c.has_class(name))
    }

    #[must_use]
    pub fn is_overlay_visible(&self) -> bool {
        self.inner.config.read(Configuration::is_overlay_visible)
    }

    #[must_use]
    pub fn is_maximize_button_visible(&self) -> bool {
        self.inner.config.read(Configuration::is_maximize_button_visible)
    }

    pub fn toggle_maximize(&self) {
        self.configure(Configuration::toggle_maximize);
    }

    pub fn toggle_collapse(&self) {
        self.configure(Configuration::toggle_collapse);
    }

    /// Header double-click: toggles only when the maximize button is shown.
    pub fn toggle_maximize_from_header(&self) -> bool {
        if !self.is_maximize_button_visible() {
            return false;
        }
        self.toggle_maximize();
        true
    }

    // -- status --------------------------------------------------------------

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.inner.tracker.is_active(self)
    }

    /// Make this the active dialog.
    pub fn activate(&self) {
        self.inner.tracker.set(self);
    }

    #[must_use]
    pub fn is_destroying(&self) -> bool {
        self.inner.destroying.get()
    }

    #[must_use]
    pub fn is_opened(&self) -> bool {
        self.inner.opened.get()
    }

    #[must_use]
    pub fn is_view_ready(&self) -> bool {
        self.inner.view_ready.get()
    }

    #[must_use]
    pub fn is_close_only_by_user(&self) -> bool {
        self.inner.close_only_by_user.get()
    }

    #[must_use]
    pub fn is_close_on_error_enabled(&self) -> bool {
        self.inner.close_on_error.get()
    }

    /// Settled or destroyed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.is_destroying() || self.inner.state.borrow().settled
    }

    #[must_use]
    pub fn current_title(&self) -> Option<String> {
        self.inner.state.borrow().title.clone()
    }

    /// Retitle at runtime; forwarded to the surface when materialized.
    pub fn set_title(&self, title: impl Into<String>) {
        let title = title.into();
        let surface = {
            let mut state = self.inner.state.borrow_mut();
            state.title = Some(title.clone());
            state.surface.clone()
        };
        if let Some(surface) = surface {
            surface.set_title(Some(&title));
        }
    }

    /// The inputs content is bound with.
    #[must_use]
    pub fn inputs(&self) -> DialogInputs {
        let state = self.inner.state.borrow();
        DialogInputs::new(
            state.title.clone(),
            state.params.clone(),
            state.additional_params.clone(),
            state.resolved.clone(),
        )
    }

    #[must_use]
    pub fn content(&self) -> Option<ContentRef> {
        self.inner.state.borrow().content.clone()
    }

    #[must_use]
    pub fn surface(&self) -> Option<Rc<dyn PresentationSurface>> {
        self.inner.state.borrow().surface.clone()
    }

    /// Rendered top-left corner, falling back to the configured position.
    #[must_use]
    pub fn rendered_offset(&self) -> Offset {
        match self.surface() {
            Some(surface) => surface.rendered_offset(),
            None => self.inner.config.read(|c| {
                Offset::new(
                    c.left_position().map_or(0.0, |d| d.value),
                    c.top_position().map_or(0.0, |d| d.value),
                )
            }),
        }
    }

    /// Rendered size, falling back to configured pixel sizes.
    #[must_use]
    pub fn rendered_size(&self) -> Size {
        match self.surface() {
            Some(surface) => surface.rendered_size(),
            None => self.inner.config.read(|c| {
                Size::new(
                    c.width().map_or(0.0, |d| d.value),
                    c.height().map_or(0.0, |d| d.value),
                )
            }),
        }
    }

    pub(crate) fn mark_active(&self, active: bool) {
        if active {
            self.tag(class_name::ACTIVE);
        } else {
            self.untag(class_name::ACTIVE);
        }
        if let Some(content) = self.content() {
            content.activated(active);
        }
    }

    pub fn auto_focus(&self) {
        if let Some(surface) = self.surface() {
            surface.auto_focus();
        }
    }

    /// Tab cycling, when enabled in the focus settings.
    pub fn focus_next(&self) -> bool {
        if !self.inner.settings.focus.enable_tab {
            return false;
        }
        match self.surface() {
            Some(surface) => {
                surface.focus_next();
                true
            }
            None => false,
        }
    }

    /// Shift-Tab cycling, when enabled in the focus settings.
    pub fn focus_previous(&self) -> bool {
        if !self.inner.settings.focus.enable_tab {
            return false;
        }
        match self.surface() {
            Some(surface) => {
                surface.focus_previous();
                true
            }
            None => false,
        }
    }

    /// ESC pressed while this dialog is active.
    pub fn on_escape(&self) -> Option<ClosingStatus> {
        let enabled = self.inner.config.read(Configuration::is_close_on_esc_enabled);
        enabled.then(|| self.cancel())
    }

    /// Click outside the dialog.
    pub fn on_backdrop_click(&self) -> Option<ClosingStatus> {
        let enabled = self
            .inner
            .config
            .read(Configuration::is_close_on_document_click_enabled);
        enabled.then(|| self.cancel())
    }

    /// New viewport: re-clamp draggable dialogs and toggle min sizes.
    pub fn viewport_resized(&self, viewport: BoundBox) {
        let compact = viewport.width < self.policy().compact_breakpoint;
        self.configure(|c| {
            c.set_viewport(viewport);
            if c.is_draggable() {
                c.reclamp_position();
            }
            if compact {
                c.clear_min_size();
            } else {
                c.restore_initial_min_size();
            }
        });
    }

    // -- lifecycle hooks -----------------------------------------------------

    pub(crate) fn install_hooks(&self, hooks: LifecycleHooks) {
        *self.inner.hooks.borrow_mut() = hooks;
    }

    pub(crate) fn clear_hooks(&self) {
        *self.inner.hooks.borrow_mut() = LifecycleHooks::default();
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<(), DialogError> {
        self.inner.queue.spawn_local(task).map_err(|err| {
            warn!(id = self.id().get(), %err, "task queue rejected dialog work");
            DialogError::Spawn(err.to_string())
        })
    }

    // -- open ----------------------------------------------------------------

    /// Run the open protocol. The returned [`Completion`] settles once with
    /// the close event.
    pub fn open(&self) -> Completion {
        let id = self.id();
        if self.inner.opened.replace(true) {
            return Completion::failed(id, DialogError::AlreadyOpened { id });
        }
        if self.is_closed() {
            return Completion::failed(id, DialogError::Cancelled { id });
        }
        let has_content = {
            let state = self.inner.state.borrow();
            state.content.is_some() || state.loader.is_some()
        };
        if !has_content {
            warn!(id = id.get(), "dialog.open without content");
            self.discard();
            return Completion::failed(id, DialogError::MissingContent { id });
        }

        let (tx, completion) = Completion::channel(id);
        self.inner.state.borrow_mut().completion = Some(tx);

        let dialog = self.clone();
        let task = async move {
            if let Err(err) = dialog.run_open().await {
                dialog.fail_open(err);
            }
        }
        .instrument(debug_span!("dialog.open", id = id.get()));
        if let Err(err) = self.spawn(task) {
            self.fail_open(err);
        }
        completion
    }

    async fn run_open(&self) -> Result<(), DialogError> {
        let id = self.id();
        let content = self.resolve_content().await?;

        let pre_open = self.inner.state.borrow_mut().pre_open.take();
        if let Some(hook) = pre_open {
            let allowed = hook().settle().await.map_err(DialogError::PreOpen)?;
            if !allowed {
                debug!(id = id.get(), "pre-open declined; dialog discarded");
                self.settle(ModalEvent::reject());
                self.discard();
                return Ok(());
            }
        }

        if let Some(resolver) = self.inner.resolver.clone() {
            let data = resolver
                .resolve(self)
                .settle()
                .await
                .map_err(DialogError::Resolver)?;
            self.inner.state.borrow_mut().resolved = Some(data);
        }

        if self.is_destroying() {
            debug!(id = id.get(), "destroyed before materializing");
            return Ok(());
        }
        let surface = self.materialize(&content)?;

        surface.view_ready().await;
        if self.is_destroying() {
            return Ok(());
        }
        self.finish_view_ready();
        Ok(())
    }

    async fn resolve_content(&self) -> Result<ContentRef, DialogError> {
        let (content, loader) = {
            let mut state = self.inner.state.borrow_mut();
            (state.content.clone(), state.loader.take())
        };
        if let Some(content) = content {
            return Ok(content);
        }
        let Some(loader) = loader else {
            return Err(DialogError::MissingContent { id: self.id() });
        };
        let content = loader().await.map_err(DialogError::Loader)?;
        self.inner.state.borrow_mut().content = Some(Rc::clone(&content));
        Ok(content)
    }

    fn materialize(&self, content: &ContentRef) -> Result<Rc<dyn PresentationSurface>, DialogError> {
        let id = self.id();
        let anchor = self
            .inner
            .collection
            .upgrade()
            .as_ref()
            .and_then(DialogCollection::anchor)
            .ok_or(DialogError::NoAnchor { id })?;

        let viewport = anchor.viewport();
        self.configure(|c| c.set_viewport(viewport));
        let snapshot = self.snapshot();
        let surface = anchor.create_surface(SurfaceRequest {
            id,
            content,
            focus: &self.inner.settings.focus,
            snapshot: &snapshot,
        });
        surface.apply(&snapshot);

        let (title, needs_focus_target) = {
            let state = self.inner.state.borrow();
            (state.title.clone(), state.focus_target.is_none())
        };
        surface.set_title(title.as_deref());
        let focus_target = if needs_focus_target {
            anchor.focused_element()
        } else {
            None
        };

        let forward = {
            let surface = Rc::clone(&surface);
            self.inner.config.subscribe(move |event| surface.on_change(event))
        };
        let visibility = {
            let weak = self.downgrade();
            self.inner.config.subscribe(move |event| {
                if let ConfigurationEvent::Visibility(visible) = event {
                    if let Some(dialog) = weak.upgrade() {
                        dialog.visibility_changed(*visible);
                    }
                }
            })
        };
        {
            let mut state = self.inner.state.borrow_mut();
            state.surface = Some(Rc::clone(&surface));
            if focus_target.is_some() {
                state.focus_target = focus_target;
            }
            state.subscriptions.push(forward);
            state.subscriptions.push(visibility);
        }

        content.attach(DialogContext::new(self));
        content.bind_inputs(&self.inputs());
        trace!(id = id.get(), "dialog.materialized");

        if self.inner.config.read(Configuration::is_visible) {
            self.inner.tracker.set(self);
        }
        Ok(surface)
    }

    fn finish_view_ready(&self) {
        self.inner.view_ready.set(true);
        let after = self.inner.state.borrow_mut().after_view_init.take();
        if let Some(after) = after {
            after(self);
        }
        if self.needs_initial_position() {
            self.calc_init_position();
        }
        let hook = self.inner.hooks.borrow().view_ready.clone();
        if let Some(hook) = hook {
            hook(self);
        }
    }

    fn needs_initial_position(&self) -> bool {
        self.inner.config.read(|c| {
            c.left_position().is_none()
                && c.top_position().is_none()
                && !c.is_position_to_screen_center_enabled()
        })
    }

    /// Cascade from the previous dialog, or center when there is none.
    fn calc_init_position(&self) {
        let Some(surface) = self.surface() else {
            return;
        };
        // The surface's viewport wins; the anchor may have resized before
        // the first render.
        let reported = surface.bound_box();
        let bound = if reported.is_bounded() {
            self.configure(|c| c.set_viewport(reported));
            reported
        } else {
            self.inner.config.read(Configuration::viewport)
        };
        if !bound.is_bounded() {
            return;
        }
        let size = surface.rendered_size();
        let offset = self.policy().cascade_offset;

        let previous = self.previous().filter(|p| p.surface().is_some());
        let (left, top) = match previous {
            Some(previous) => {
                let at = previous.rendered_offset();
                let left = if at.left + size.width + offset < bound.width {
                    at.left + offset
                } else {
                    offset
                };
                let top = if at.top + size.height + offset < bound.height {
                    at.top + offset
                } else {
                    offset
                };
                (left, top)
            }
            None => (
                (bound.width - size.width) / 2.0,
                (bound.height - size.height) / 2.0,
            ),
        };
        trace!(id = self.id().get(), left, top, "dialog.initial_position");
        self.configure(|c| c.set_position(top.max(0.0), left));
    }

    fn visibility_changed(&self, visible: bool) {
        let tracker = &self.inner.tracker;
        if visible {
            if self.surface().is_some() {
                tracker.set(self);
            }
        } else if tracker.is_active(self) {
            match self.previous() {
                Some(previous) => tracker.set(&previous),
                None => tracker.clear(),
            }
        }
    }

    fn settle(&self, event: ModalEvent) {
        let sender = {
            let mut state = self.inner.state.borrow_mut();
            state.settled = true;
            state.completion.take()
        };
        if let Some(sender) = sender {
            // Nobody awaiting is fine.
            let _ = sender.send(Ok(event));
        }
    }

    fn fail_open(&self, error: DialogError) {
        warn!(id = self.id().get(), %error, "dialog.open failed");
        let sender = {
            let mut state = self.inner.state.borrow_mut();
            state.settled = true;
            state.completion.take()
        };
        if let Some(sender) = sender {
            let _ = sender.send(Err(error));
        }
        if self.surface().is_none() {
            self.discard();
        }
    }

    /// Drop a dialog that never materialized without touching the tracker.
    fn discard(&self) {
        self.inner.destroying.set(true);
        if let Some(collection) = self.inner.collection.upgrade() {
            collection.remove(self);
        }
    }

    // -- close ---------------------------------------------------------------

    pub fn cancel(&self) -> ClosingStatus {
        self.close(None, ModalEventType::Cancel)
    }

    pub fn confirm(&self, data: impl Into<Option<Value>>) -> ClosingStatus {
        self.close(data.into(), ModalEventType::Confirm)
    }

    /// Start a close attempt of `kind`. See [`Self::perform_closing`].
    pub fn close(&self, data: Option<Value>, kind: ModalEventType) -> ClosingStatus {
        let id = self.id();
        let (tx, status) = ClosingStatus::channel(id);
        let dialog = self.clone();
        let task = async move {
            let outcome = dialog.perform_closing(kind, data).await;
            let _ = tx.send(outcome);
        }
        .instrument(debug_span!("dialog.close", id = id.get(), ?kind));
        match self.spawn(task) {
            Ok(()) => status,
            Err(err) => ClosingStatus::failed(id, err),
        }
    }

    /// Consult the pre-close hooks, then settle and destroy.
    ///
    /// A veto leaves the dialog untouched. A hook failure is returned; with
    /// `close_on_error` the dialog is still closed with `Cancel`.
    pub async fn perform_closing(
        &self,
        kind: ModalEventType,
        data: Option<Value>,
    ) -> Result<CloseOutcome, DialogError> {
        if self.is_closed() {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        let event = ModalEvent::new(kind, data);

        match self.consult_pre_close(&event).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(id = self.id().get(), ?kind, "close vetoed");
                return Ok(CloseOutcome::Vetoed);
            }
            Err(err) => {
                warn!(id = self.id().get(), %err, "pre-close hook failed");
                if self.inner.close_on_error.get() && !self.is_closed() {
                    self.settle(ModalEvent::cancel());
                    self.destroy(false);
                }
                return Err(DialogError::PreClose(err));
            }
        }

        if self.is_closed() {
            return Ok(CloseOutcome::AlreadyClosed);
        }
        self.settle(event);
        self.destroy(false);
        Ok(CloseOutcome::Closed)
    }

    async fn consult_pre_close(&self, event: &ModalEvent) -> Result<bool, HookError> {
        if let Some(content) = self.content() {
            if !content.pre_close(event.kind).settle().await? {
                return Ok(false);
            }
        }
        let hook = self.inner.state.borrow().pre_close.clone();
        if let Some(hook) = hook {
            if !hook(event).settle().await? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Only dialog left in its collection (or detached from any).
    fn is_last_in_collection(&self) -> bool {
        self.inner
            .collection
            .upgrade()
            .is_none_or(|collection| collection.len() <= 1)
    }

    /// Tear the dialog down. Unless `force`, focus goes back to the previous
    /// dialog, or to the recorded focus-return target when this is the last
    /// dialog of its collection.
    pub fn destroy(&self, force: bool) {
        if self.inner.destroying.replace(true) {
            return;
        }
        let id = self.id();
        debug!(id = id.get(), force, "dialog.destroy");

        let hook = self.inner.hooks.borrow().destroy.clone();
        if !force {
            match self.previous() {
                Some(previous) => {
                    if hook.is_none() && self.inner.tracker.is_active(self) {
                        self.inner.tracker.set(&previous);
                    }
                }
                None if self.is_last_in_collection() => {
                    let target = self.inner.state.borrow().focus_target.clone();
                    if let Some(target) = target {
                        if let Err(err) = target.focus() {
                            debug!(id = id.get(), %err, "focus restoration failed");
                        }
                    }
                }
                None => {}
            }
        }

        match hook {
            Some(hook) => hook(self, force),
            None => self.inner.tracker.forget(self),
        }

        let (surface, subscriptions, completion) = {
            let mut state = self.inner.state.borrow_mut();
            state.focus_target = None;
            (
                state.surface.take(),
                std::mem::take(&mut state.subscriptions),
                state.completion.take(),
            )
        };
        drop(subscriptions);
        drop(completion);
        if let Some(surface) = surface {
            surface.destroy();
        }
    }
}
