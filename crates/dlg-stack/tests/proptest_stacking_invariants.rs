//! Property tests for the active tracker: single active dialog, overlay
//! exclusivity and monotonic stack order under random activity.

use std::rc::Rc;

use dlg_core::{DialogSettings, class_name};
use dlg_stack::{ActiveTracker, DialogCollection, DialogHandle};
use futures::executor::LocalPool;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Create { overlay: bool },
    Activate(usize),
    Destroy { index: usize, force: bool },
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => any::<bool>().prop_map(|overlay| Op::Create { overlay }),
        4 => (0usize..16).prop_map(Op::Activate),
        2 => (0usize..16, any::<bool>()).prop_map(|(index, force)| Op::Destroy { index, force }),
    ]
}

fn pick(collection: &DialogCollection, index: usize) -> Option<DialogHandle> {
    let dialogs = collection.dialogs();
    if dialogs.is_empty() {
        None
    } else {
        Some(dialogs[index % dialogs.len()].clone())
    }
}

fn tagged(collection: &DialogCollection, name: &str) -> Vec<DialogHandle> {
    collection
        .dialogs()
        .into_iter()
        .filter(|d| d.has_class(name))
        .collect()
}

// ═══════════════════════════════════════════════════════════════════════════
// Tracker invariants
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn tracker_invariants_hold(ops in proptest::collection::vec(op(), 1..60)) {
        let pool = LocalPool::new();
        let tracker = ActiveTracker::new();
        let collection = DialogCollection::new(
            tracker.clone(),
            Rc::new(pool.spawner()),
            Rc::new(DialogSettings::default()),
        );
        let mut highest_activation = 0u32;

        for op in ops {
            match op {
                Op::Create { overlay } => {
                    let _ = collection.create(None).overlay(overlay);
                }
                Op::Activate(index) => {
                    let Some(dialog) = pick(&collection, index) else { continue };
                    let was_active = dialog.is_active();
                    dialog.activate();
                    prop_assert!(dialog.is_active());
                    if !was_active {
                        let order = dialog.order().unwrap_or(0);
                        prop_assert!(order > highest_activation);
                        highest_activation = order;
                    }
                    if dialog.is_overlay_visible() {
                        prop_assert!(dialog.has_class(class_name::OVERLAY_ACTIVE));
                    }
                }
                Op::Destroy { index, force } => {
                    let Some(dialog) = pick(&collection, index) else { continue };
                    dialog.destroy(force);
                    prop_assert!(!collection.contains(&dialog));
                }
            }

            let active = tagged(&collection, class_name::ACTIVE);
            prop_assert!(active.len() <= 1);
            match tracker.get() {
                Some(current) => {
                    prop_assert_eq!(active.len(), 1);
                    prop_assert!(active[0].ptr_eq(&current));
                }
                None => prop_assert!(active.is_empty()),
            }

            let overlay = tagged(&collection, class_name::OVERLAY_ACTIVE);
            prop_assert!(overlay.len() <= 1);
            if let Some(owner) = overlay.first() {
                prop_assert!(owner.is_overlay_visible());
                prop_assert!(tracker.overlay_owner().is_some_and(|o| o.ptr_eq(owner)));
            }
        }
    }

    #[test]
    fn ids_and_links_follow_creation_order(count in 1usize..20) {
        let pool = LocalPool::new();
        let collection = DialogCollection::new(
            ActiveTracker::new(),
            Rc::new(pool.spawner()),
            Rc::new(DialogSettings::default()),
        );
        let dialogs: Vec<_> = (0..count).map(|_| collection.create(None)).collect();
        for pair in dialogs.windows(2) {
            prop_assert!(pair[0].id() < pair[1].id());
            prop_assert!(pair[1].previous().is_some_and(|p| p.ptr_eq(&pair[0])));
        }
    }
}
