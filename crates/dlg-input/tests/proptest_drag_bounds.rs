//! Property tests: whatever the pointer does, committed geometry respects
//! the bound box and the minimum size.

use std::rc::Rc;
use std::time::Duration;

use dlg_core::{BoundBox, DialogSettings};
use dlg_input::{DragController, PointerEvent, ResizeController, ResizeEdges};
use dlg_stack::{ActiveTracker, DialogCollection, DialogHandle};
use futures::executor::LocalPool;
use proptest::prelude::*;
use web_time::Instant;

fn desktop_dialog(pool: &LocalPool, vw: f64, vh: f64) -> (DialogCollection, DialogHandle) {
    let collection = DialogCollection::new(
        ActiveTracker::new(),
        Rc::new(pool.spawner()),
        Rc::new(DialogSettings::default()),
    );
    let dialog = collection
        .create(None)
        .set_dimensions(200.0, 300.0)
        .draggable(true)
        .resizable(true);
    dialog.configure(|c| {
        c.set_viewport(BoundBox::new(vw, vh));
        c.set_position(50.0, 50.0);
    });
    dialog.activate();
    (collection, dialog)
}

// ═══════════════════════════════════════════════════════════════════════════
// Drag commits stay grabbable
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn dragged_position_stays_in_bounds(
        vw in 800.0f64..3000.0,
        vh in 100.0f64..2000.0,
        path in proptest::collection::vec((-5000.0f64..5000.0, -5000.0f64..5000.0), 1..8),
    ) {
        let pool = LocalPool::new();
        let (_c, dialog) = desktop_dialog(&pool, vw, vh);
        let mut drag = DragController::new(&dialog).with_hold(Duration::ZERO);
        let t0 = Instant::now();

        prop_assert!(drag.pointer_down(&PointerEvent::at(60.0, 60.0, t0)));
        for &(x, y) in &path {
            drag.pointer_move(&PointerEvent::at(x, y, t0));
        }
        let (x, y) = path[path.len() - 1];
        let committed = drag.pointer_up(&PointerEvent::at(x, y, t0));
        let Some(at) = committed else {
            return Err(TestCaseError::fail("drag did not commit"));
        };
        prop_assert!(at.left <= vw - 30.0);
        prop_assert!(at.left >= -300.0 + 90.0);
        prop_assert!(at.top >= 0.0);
        prop_assert!(at.top <= vh - 30.0);
    }

    #[test]
    fn resized_size_respects_minimum(
        x in -2000.0f64..4000.0,
        y in -2000.0f64..4000.0,
    ) {
        let pool = LocalPool::new();
        let (_c, dialog) = desktop_dialog(&pool, 1600.0, 1200.0);
        let mut resize = ResizeController::new(&dialog);
        prop_assert!(resize.pointer_down(&PointerEvent::new(350.0, 250.0), ResizeEdges::BOTH));
        resize.pointer_move(&PointerEvent::new(x, y));
        let Some(size) = resize.pointer_up(&PointerEvent::new(x, y)) else {
            return Err(TestCaseError::fail("resize did not commit"));
        };
        prop_assert!(size.width >= 300.0);
        prop_assert!(size.height >= 200.0);
    }
}
