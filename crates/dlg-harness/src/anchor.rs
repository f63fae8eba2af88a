//! In-memory anchor and surface.

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::Rc;

use dlg_core::{
    BoundBox, ConfigurationEvent, ConfigurationSnapshot, Dimension, DimensionUnits, Offset, Size,
};
use dlg_stack::{Anchor, DialogId, FocusTarget, PresentationSurface, SurfaceRequest};
use futures::channel::oneshot;
use futures::future::LocalBoxFuture;
use futures::FutureExt;

/// When a fake surface reports view-ready.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewReadyMode {
    /// On the first poll of `view_ready()`.
    #[default]
    Immediate,
    /// Only after [`FakeSurface::fire_view_ready`].
    Manual,
}

#[derive(Debug, Default)]
struct SurfaceState {
    snapshot: Option<ConfigurationSnapshot>,
    events: Vec<ConfigurationEvent>,
    classes: BTreeSet<String>,
    title: Option<String>,
    width: Option<Dimension>,
    height: Option<Dimension>,
    left: Option<Dimension>,
    top: Option<Dimension>,
}

/// Records everything the core does to a surface.
#[derive(Debug)]
pub struct FakeSurface {
    id: DialogId,
    viewport: Rc<Cell<BoundBox>>,
    intrinsic: Size,
    state: RefCell<SurfaceState>,
    ready_tx: RefCell<Option<oneshot::Sender<()>>>,
    ready_rx: RefCell<Option<oneshot::Receiver<()>>>,
    mode: ViewReadyMode,
    auto_focus_calls: Cell<usize>,
    focus_next_calls: Cell<usize>,
    focus_previous_calls: Cell<usize>,
    destroyed: Cell<bool>,
}

impl FakeSurface {
    fn new(id: DialogId, viewport: Rc<Cell<BoundBox>>, intrinsic: Size, mode: ViewReadyMode) -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            id,
            viewport,
            intrinsic,
            state: RefCell::new(SurfaceState::default()),
            ready_tx: RefCell::new(Some(tx)),
            ready_rx: RefCell::new(Some(rx)),
            mode,
            auto_focus_calls: Cell::new(0),
            focus_next_calls: Cell::new(0),
            focus_previous_calls: Cell::new(0),
            destroyed: Cell::new(false),
        }
    }

    #[must_use]
    pub fn id(&self) -> DialogId {
        self.id
    }

    /// Release a [`ViewReadyMode::Manual`] surface.
    pub fn fire_view_ready(&self) {
        if let Some(tx) = self.ready_tx.borrow_mut().take() {
            let _ = tx.send(());
        }
    }

    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.state.borrow().classes.contains(name)
    }

    #[must_use]
    pub fn classes(&self) -> Vec<String> {
        self.state.borrow().classes.iter().cloned().collect()
    }

    #[must_use]
    pub fn events(&self) -> Vec<ConfigurationEvent> {
        self.state.borrow().events.clone()
    }

    #[must_use]
    pub fn applied(&self) -> Option<ConfigurationSnapshot> {
        self.state.borrow().snapshot.clone()
    }

    #[must_use]
    pub fn title(&self) -> Option<String> {
        self.state.borrow().title.clone()
    }

    #[must_use]
    pub fn auto_focus_calls(&self) -> usize {
        self.auto_focus_calls.get()
    }

    #[must_use]
    pub fn focus_next_calls(&self) -> usize {
        self.focus_next_calls.get()
    }

    #[must_use]
    pub fn focus_previous_calls(&self) -> usize {
        self.focus_previous_calls.get()
    }

    #[must_use]
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }

    fn resolve(&self, dimension: Option<Dimension>, extent: f64, fallback: f64) -> f64 {
        match dimension {
            Some(d) if d.units == DimensionUnits::Percentage && extent.is_finite() => {
                extent * d.value / 100.0
            }
            Some(d) if d.units == DimensionUnits::Pixel && d.value > 0.0 => d.value,
            _ => fallback,
        }
    }
}

impl PresentationSurface for FakeSurface {
    fn apply(&self, snapshot: &ConfigurationSnapshot) {
        let mut state = self.state.borrow_mut();
        state.classes = snapshot.class_names.iter().cloned().collect();
        state.width = snapshot.width;
        state.height = snapshot.height;
        state.left = snapshot.left;
        state.top = snapshot.top;
        state.snapshot = Some(snapshot.clone());
    }

    fn on_change(&self, event: &ConfigurationEvent) {
        let mut state = self.state.borrow_mut();
        match event {
            ConfigurationEvent::ClassAdded(name) => {
                state.classes.insert(name.clone());
            }
            ConfigurationEvent::ClassRemoved(name) => {
                state.classes.remove(name);
            }
            ConfigurationEvent::Width(d) => state.width = Some(*d),
            ConfigurationEvent::Height(d) => state.height = Some(*d),
            ConfigurationEvent::Position { top, left } => {
                state.top = *top;
                state.left = *left;
            }
            _ => {}
        }
        state.events.push(event.clone());
    }

    fn set_title(&self, title: Option<&str>) {
        self.state.borrow_mut().title = title.map(str::to_owned);
    }

    fn rendered_size(&self) -> Size {
        let viewport = self.viewport.get();
        let state = self.state.borrow();
        Size::new(
            self.resolve(state.width, viewport.width, self.intrinsic.width),
            self.resolve(state.height, viewport.height, self.intrinsic.height),
        )
    }

    fn rendered_offset(&self) -> Offset {
        let state = self.state.borrow();
        Offset::new(
            state.left.map_or(0.0, |d| d.value),
            state.top.map_or(0.0, |d| d.value),
        )
    }

    fn bound_box(&self) -> BoundBox {
        self.viewport.get()
    }

    fn auto_focus(&self) {
        self.auto_focus_calls.set(self.auto_focus_calls.get() + 1);
    }

    fn focus_next(&self) {
        self.focus_next_calls.set(self.focus_next_calls.get() + 1);
    }

    fn focus_previous(&self) {
        self.focus_previous_calls.set(self.focus_previous_calls.get() + 1);
    }

    fn view_ready(&self) -> LocalBoxFuture<'static, ()> {
        if self.mode == ViewReadyMode::Immediate {
            self.fire_view_ready();
        }
        match self.ready_rx.borrow_mut().take() {
            Some(rx) => async move {
                // A dropped sender still counts as ready.
                let _ = rx.await;
            }
            .boxed_local(),
            None => futures::future::ready(()).boxed_local(),
        }
    }

    fn destroy(&self) {
        self.destroyed.set(true);
    }
}

/// Mount point backed by [`FakeSurface`]s.
pub struct FakeAnchor {
    viewport: Rc<Cell<BoundBox>>,
    intrinsic: Cell<Size>,
    mode: Cell<ViewReadyMode>,
    surfaces: RefCell<Vec<Rc<FakeSurface>>>,
    focused: RefCell<Option<Rc<dyn FocusTarget>>>,
}

impl std::fmt::Debug for FakeAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FakeAnchor")
            .field("viewport", &self.viewport.get())
            .field("surfaces", &self.surface_count())
            .field("focused", &self.focused.borrow().is_some())
            .finish_non_exhaustive()
    }
}

impl FakeAnchor {
    /// Anchor with the given viewport; surfaces render 400x300 unless sized.
    #[must_use]
    pub fn new(viewport: BoundBox) -> Self {
        Self {
            viewport: Rc::new(Cell::new(viewport)),
            intrinsic: Cell::new(Size::new(400.0, 300.0)),
            mode: Cell::new(ViewReadyMode::Immediate),
            surfaces: RefCell::new(Vec::new()),
            focused: RefCell::new(None),
        }
    }

    #[must_use]
    pub fn with_intrinsic_size(self, size: Size) -> Self {
        self.intrinsic.set(size);
        self
    }

    pub fn set_view_ready_mode(&self, mode: ViewReadyMode) {
        self.mode.set(mode);
    }

    pub fn set_viewport(&self, viewport: BoundBox) {
        self.viewport.set(viewport);
    }

    /// Element reported as focused when the next dialog opens.
    pub fn set_focused(&self, target: Option<Rc<dyn FocusTarget>>) {
        *self.focused.borrow_mut() = target;
    }

    #[must_use]
    pub fn surface(&self, id: DialogId) -> Option<Rc<FakeSurface>> {
        self.surfaces.borrow().iter().find(|s| s.id == id).cloned()
    }

    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.surfaces.borrow().len()
    }
}

impl Anchor for FakeAnchor {
    fn create_surface(&self, request: SurfaceRequest<'_>) -> Rc<dyn PresentationSurface> {
        let surface = Rc::new(FakeSurface::new(
            request.id,
            Rc::clone(&self.viewport),
            self.intrinsic.get(),
            self.mode.get(),
        ));
        self.surfaces.borrow_mut().push(Rc::clone(&surface));
        surface
    }

    fn viewport(&self) -> BoundBox {
        self.viewport.get()
    }

    fn focused_element(&self) -> Option<Rc<dyn FocusTarget>> {
        self.focused.borrow().clone()
    }
}
