//! One-stop fixture: pool, tracker, service and anchored fake.

use std::future::Future;
use std::rc::Rc;

use dlg_core::{BoundBox, DialogSettings};
use dlg_stack::{ActiveTracker, DialogHandle, DialogService, TaskQueue};
use futures::executor::LocalPool;

use crate::anchor::{FakeAnchor, FakeSurface};

/// Default viewport: a desktop-sized window.
pub const DESKTOP: BoundBox = BoundBox::new(1280.0, 800.0);

/// Single-threaded fixture driving a [`DialogService`] over a [`FakeAnchor`].
///
/// Each harness has its own [`ActiveTracker`], so tests never share state
/// through the thread-wide tracker.
pub struct Harness {
    pool: LocalPool,
    tracker: ActiveTracker,
    service: DialogService,
    anchor: Rc<FakeAnchor>,
}

impl std::fmt::Debug for Harness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Harness")
            .field("tracker", &self.tracker)
            .field("service", &self.service)
            .field("anchor", &self.anchor)
            .finish_non_exhaustive()
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}

impl Harness {
    #[must_use]
    pub fn new() -> Self {
        Self::with_viewport(DESKTOP)
    }

    #[must_use]
    pub fn with_viewport(viewport: BoundBox) -> Self {
        Self::with_settings(viewport, DialogSettings::default())
    }

    #[must_use]
    pub fn with_settings(viewport: BoundBox, settings: DialogSettings) -> Self {
        let pool = LocalPool::new();
        let tracker = ActiveTracker::new();
        let queue: TaskQueue = Rc::new(pool.spawner());
        let service = DialogService::with_tracker(tracker.clone(), queue, settings);
        let anchor = Rc::new(FakeAnchor::new(viewport));
        service.register_anchor(Rc::clone(&anchor) as Rc<dyn dlg_stack::Anchor>);
        Self {
            pool,
            tracker,
            service,
            anchor,
        }
    }

    #[must_use]
    pub fn service(&self) -> &DialogService {
        &self.service
    }

    #[must_use]
    pub fn tracker(&self) -> &ActiveTracker {
        &self.tracker
    }

    #[must_use]
    pub fn anchor(&self) -> &Rc<FakeAnchor> {
        &self.anchor
    }

    /// A fresh task queue on this harness's pool.
    #[must_use]
    pub fn queue(&self) -> TaskQueue {
        Rc::new(self.pool.spawner())
    }

    /// Run spawned work until nothing can make progress.
    pub fn settle(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Drive the pool until `future` completes.
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }

    /// The fake surface of `dialog`, once materialized.
    #[must_use]
    pub fn surface(&self, dialog: &DialogHandle) -> Option<Rc<FakeSurface>> {
        self.anchor.surface(dialog.id())
    }

    /// Ids of the dialogs currently carrying `class`.
    #[must_use]
    pub fn tagged(&self, class: &str) -> Vec<dlg_stack::DialogId> {
        self.service
            .dialogs()
            .iter()
            .filter(|d| d.has_class(class))
            .map(DialogHandle::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ScriptedContent;
    use dlg_stack::ModalEventType;
    use serde_json::json;

    #[test]
    fn open_materializes_on_the_fake_anchor() {
        let mut h = Harness::new();
        let content = ScriptedContent::new();
        let dialog = h.service().component(content.as_content()).title("Hello");
        let completion = dialog.open();
        h.settle();

        let surface = h.surface(&dialog).expect("surface");
        assert_eq!(surface.title().as_deref(), Some("Hello"));
        assert!(dialog.is_active());
        assert_eq!(content.attach_count(), 1);

        let _ = dialog.confirm(json!({"a": 1}));
        let event = h.run_until(completion).expect("settled");
        assert_eq!(event.kind, ModalEventType::Confirm);
        assert!(surface.is_destroyed());
    }
}
