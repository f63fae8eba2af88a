//! Property tests for configuration clamping and mode round-trips.

use dlg_core::{Axis, BoundBox, Configuration, Dimension};
use proptest::prelude::*;

fn desktop(width: f64, height: f64) -> Configuration {
    let mut config = Configuration::default();
    config.set_viewport(BoundBox::new(width, height));
    config
}

fn dimension() -> impl Strategy<Value = Option<Dimension>> {
    prop_oneof![
        Just(None),
        (1.0f64..2000.0).prop_map(|v| Some(Dimension::px(v))),
        (1.0f64..100.0).prop_map(|v| Some(Dimension::percent(v))),
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
// Bound-box clamping
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn desktop_left_stays_grabbable(
        vw in 760.0f64..4000.0,
        vh in 100.0f64..3000.0,
        width in 10.0f64..2000.0,
        left in -10_000.0f64..10_000.0,
    ) {
        let mut config = desktop(vw, vh);
        config.set_width(Some(Dimension::px(width)), true);
        config.set_left_position(left);
        let stored = config.left_position().map(|d| d.value).unwrap_or(f64::NAN);
        prop_assert!(stored <= vw - 30.0);
        prop_assert!(stored >= -width + 90.0 || stored == vw - 30.0);
    }

    #[test]
    fn desktop_top_stays_in_band(
        vw in 760.0f64..4000.0,
        vh in 31.0f64..3000.0,
        top in -10_000.0f64..10_000.0,
    ) {
        let mut config = desktop(vw, vh);
        config.set_top_position(top);
        let stored = config.top_position().map(|d| d.value).unwrap_or(f64::NAN);
        prop_assert!(stored >= 0.0);
        prop_assert!(stored <= vh - 30.0);
    }

    #[test]
    fn mobile_ignores_requested_left(
        vw in 1.0f64..759.0,
        width in 1.0f64..700.0,
        a in -5000.0f64..5000.0,
        b in -5000.0f64..5000.0,
    ) {
        let mut config = desktop(vw, 800.0);
        config.set_width(Some(Dimension::px(width)), true);
        prop_assert_eq!(
            config.check_bound_box(Axis::Horizontal, a),
            config.check_bound_box(Axis::Horizontal, b)
        );
    }

    #[test]
    fn clamping_is_idempotent(
        vw in 760.0f64..4000.0,
        vh in 31.0f64..3000.0,
        left in -10_000.0f64..10_000.0,
        top in -10_000.0f64..10_000.0,
    ) {
        let mut config = desktop(vw, vh);
        config.set_width(Some(Dimension::px(400.0)), true);
        config.set_position(top, left);
        let first = (config.top_position(), config.left_position());
        config.reclamp_position();
        prop_assert_eq!(first, (config.top_position(), config.left_position()));
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Mode round-trips
// ═══════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn maximize_round_trip_restores_sizes_and_flags(
        height in dimension(),
        width in dimension(),
        min_height in dimension(),
        min_width in dimension(),
        draggable in any::<bool>(),
        resizable in any::<bool>(),
    ) {
        let mut config = desktop(1920.0, 1080.0);
        config.set_min_height(min_height, true);
        config.set_min_width(min_width, true);
        config.set_height(height, true);
        config.set_width(width, true);
        config.set_draggable(draggable, true);
        config.set_resizable(resizable, true);
        let before = config.snapshot();

        config.set_maximized(true);
        config.set_maximized(false);
        let after = config.snapshot();

        prop_assert_eq!(after.height, before.height);
        prop_assert_eq!(after.min_height, before.min_height);
        prop_assert_eq!(after.width, before.width);
        prop_assert_eq!(after.min_width, before.min_width);
        prop_assert_eq!(after.max_width, before.max_width);
        prop_assert_eq!(after.max_height, before.max_height);
        prop_assert_eq!(after.resizable, before.resizable);
        prop_assert_eq!(after.draggable, before.draggable);
        prop_assert!(!after.maximized);
    }

    #[test]
    fn collapse_round_trip_restores_sizes_and_flags(
        height in prop::option::of((29.0f64..2000.0).prop_map(Dimension::px)),
        min_height in prop::option::of((1.0f64..2000.0).prop_map(Dimension::px)),
        width in dimension(),
        resizable in any::<bool>(),
    ) {
        let mut config = desktop(1920.0, 1080.0);
        if min_height.is_some() {
            config.set_min_height(min_height, true);
        }
        if height.is_some() {
            config.set_height(height, true);
        }
        config.set_width(width, true);
        config.set_resizable(resizable, true);
        let before = config.snapshot();
        let initial_before = config.initial_min_size();

        config.set_collapsed(true);
        prop_assert!(!config.is_resizable());
        config.set_collapsed(false);
        let after = config.snapshot();

        prop_assert_eq!(after.height, before.height);
        prop_assert_eq!(after.min_height, before.min_height);
        prop_assert_eq!(after.width, before.width);
        prop_assert_eq!(after.min_width, before.min_width);
        prop_assert_eq!(after.resizable, before.resizable);
        prop_assert_eq!(after.draggable, before.draggable);
        prop_assert_eq!(config.initial_min_size(), initial_before);
    }
}
