#![forbid(unsafe_code)]

//! Authoritative per-dialog state.
//!
//! A [`Configuration`] is mutated only through its own setters. Every setter
//! records the new value and then broadcasts a [`ConfigurationEvent`] on the
//! configuration's [`ChangeStream`]; presentation surfaces and dialog
//! handles react to that stream instead of reading fields ad hoc.
//!
//! # Invariants
//!
//! 1. `maximized` implies `draggable == false`, `resizable == false`, and
//!    min/max width plus max height pinned to 100%.
//! 2. `collapsed` implies `height == min_height == collapsed_height px` and
//!    `resizable == false`.
//! 3. Leaving either mode restores the values captured in [`SavedState`].
//! 4. Stored positions are always the result of [`Configuration::check_bound_box`].
//! 5. The maximize button is only reported visible when it was enabled and
//!    neither `max_width` nor `max_height` is set.
//!
//! # Failure Modes
//!
//! - **Zero or unset dimensions are silent**: dimension setters record a
//!   zero or `None` value but do not broadcast it. Surfaces that need the
//!   cleared value must read a [`ConfigurationSnapshot`].
//! - **Duplicate class events**: `add_class`/`remove_class` always emit, even
//!   when the set did not change.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use ahash::AHashSet;

use crate::change::{ChangeStream, Subscription};
use crate::class_name;
use crate::dimension::Dimension;
use crate::geometry::BoundBox;
use crate::settings::DialogPolicy;

/// One variant per mutated field.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigurationEvent {
    Visibility(bool),
    OverlayVisibility(bool),
    CloseOnEsc(bool),
    CloseOnDocumentClick(bool),
    ScreenCenter(bool),
    Draggable(bool),
    Resizable(bool),
    Fullscreen(bool),
    Collapse(bool),
    DesktopBehavior(bool),
    ClassAdded(String),
    ClassRemoved(String),
    Height(Dimension),
    MinHeight(Dimension),
    MaxHeight(Dimension),
    Width(Dimension),
    MinWidth(Dimension),
    MaxWidth(Dimension),
    Position {
        top: Option<Dimension>,
        left: Option<Dimension>,
    },
}

/// Axis argument for [`Configuration::check_bound_box`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Values captured before entering maximized or collapsed mode.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SavedState {
    pub resizable: bool,
    pub draggable: bool,
    pub height: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_height: Option<Dimension>,
    pub width: Option<Dimension>,
    pub min_width: Option<Dimension>,
    pub max_width: Option<Dimension>,
}

/// Plain copy of every field, handed to presentation surfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigurationSnapshot {
    pub visible: bool,
    pub overlay_visible: bool,
    pub position_to_screen_center: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub maximized: bool,
    pub collapsed: bool,
    pub desktop_behavior_preserved: bool,
    pub close_on_esc: bool,
    pub close_on_document_click: bool,
    pub close_button_visible: bool,
    pub maximize_button_visible: bool,
    pub collapse_button_visible: bool,
    pub height: Option<Dimension>,
    pub min_height: Option<Dimension>,
    pub max_height: Option<Dimension>,
    pub width: Option<Dimension>,
    pub min_width: Option<Dimension>,
    pub max_width: Option<Dimension>,
    pub left: Option<Dimension>,
    pub top: Option<Dimension>,
    pub stack_order: Option<u32>,
    /// Sorted for stable comparisons.
    pub class_names: Vec<String>,
}

/// Per-dialog state with change events.
pub struct Configuration {
    policy: DialogPolicy,
    viewport: BoundBox,

    visible: bool,
    overlay_visible: bool,
    position_to_screen_center: bool,
    draggable: bool,
    resizable: bool,
    maximized: bool,
    collapsed: bool,
    desktop_behavior_preserved: bool,
    close_on_esc: bool,
    close_on_document_click: bool,

    close_button_visible: bool,
    maximize_button_enabled: bool,
    collapse_button_visible: bool,

    height: Option<Dimension>,
    min_height: Option<Dimension>,
    max_height: Option<Dimension>,
    width: Option<Dimension>,
    min_width: Option<Dimension>,
    max_width: Option<Dimension>,

    init_min_height: Option<Dimension>,
    init_max_height: Option<Dimension>,
    init_min_width: Option<Dimension>,
    init_max_width: Option<Dimension>,

    left: Option<Dimension>,
    top: Option<Dimension>,
    stack_order: Option<u32>,

    class_names: AHashSet<String>,
    saved: SavedState,
    changes: ChangeStream<ConfigurationEvent>,
}

impl std::fmt::Debug for Configuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Configuration")
            .field("snapshot", &self.snapshot())
            .field("viewport", &self.viewport)
            .finish_non_exhaustive()
    }
}

impl Default for Configuration {
    fn default() -> Self {
        Self::new(DialogPolicy::default())
    }
}

impl Configuration {
    /// Fresh configuration: visible, with overlay and close button, nothing
    /// else enabled, no sizes, unbounded viewport.
    #[must_use]
    pub fn new(policy: DialogPolicy) -> Self {
        Self {
            policy,
            viewport: BoundBox::UNBOUNDED,
            visible: true,
            overlay_visible: true,
            position_to_screen_center: false,
            draggable: false,
            resizable: false,
            maximized: false,
            collapsed: false,
            desktop_behavior_preserved: false,
            close_on_esc: false,
            close_on_document_click: false,
            close_button_visible: true,
            maximize_button_enabled: false,
            collapse_button_visible: false,
            height: None,
            min_height: None,
            max_height: None,
            width: None,
            min_width: None,
            max_width: None,
            init_min_height: None,
            init_max_height: None,
            init_min_width: None,
            init_max_width: None,
            left: None,
            top: None,
            stack_order: None,
            class_names: AHashSet::new(),
            saved: SavedState::default(),
            changes: ChangeStream::new(),
        }
    }

    /// The stream this configuration broadcasts on.
    #[must_use]
    pub fn changes(&self) -> &ChangeStream<ConfigurationEvent> {
        &self.changes
    }

    /// Shorthand for `changes().subscribe(..)`.
    pub fn subscribe(&self, callback: impl Fn(&ConfigurationEvent) + 'static) -> Subscription {
        self.changes.subscribe(callback)
    }

    fn emit(&self, event: ConfigurationEvent) {
        self.changes.emit(event);
    }

    #[must_use]
    pub fn policy(&self) -> &DialogPolicy {
        &self.policy
    }

    // -- viewport ------------------------------------------------------------

    #[must_use]
    pub fn viewport(&self) -> BoundBox {
        self.viewport
    }

    /// Record the bound box used for clamping. Does not re-clamp or emit.
    pub fn set_viewport(&mut self, viewport: BoundBox) {
        self.viewport = viewport;
    }

    // -- flags ---------------------------------------------------------------

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
        self.emit(ConfigurationEvent::Visibility(visible));
    }

    #[must_use]
    pub fn is_overlay_visible(&self) -> bool {
        self.overlay_visible
    }

    /// Toggles the `without-overlay` tag inversely.
    pub fn set_overlay_visible(&mut self, visible: bool) {
        self.overlay_visible = visible;
        if visible {
            self.remove_class(class_name::WITHOUT_OVERLAY);
        } else {
            self.add_class(class_name::WITHOUT_OVERLAY);
        }
        self.emit(ConfigurationEvent::OverlayVisibility(visible));
    }

    #[must_use]
    pub fn is_close_on_esc_enabled(&self) -> bool {
        self.close_on_esc
    }

    pub fn set_close_on_esc(&mut self, enabled: bool) {
        self.close_on_esc = enabled;
        self.emit(ConfigurationEvent::CloseOnEsc(enabled));
    }

    #[must_use]
    pub fn is_close_on_document_click_enabled(&self) -> bool {
        self.close_on_document_click
    }

    pub fn set_close_on_document_click(&mut self, enabled: bool) {
        self.close_on_document_click = enabled;
        self.emit(ConfigurationEvent::CloseOnDocumentClick(enabled));
    }

    #[must_use]
    pub fn is_position_to_screen_center_enabled(&self) -> bool {
        self.position_to_screen_center
    }

    pub fn set_position_to_screen_center(&mut self, center: bool) {
        self.position_to_screen_center = center;
        self.emit(ConfigurationEvent::ScreenCenter(center));
    }

    #[must_use]
    pub fn is_desktop_behavior_preserved(&self) -> bool {
        self.desktop_behavior_preserved
    }

    /// Keep desktop layout rules on narrow viewports. Toggles the
    /// `behavior-preserved` tag.
    pub fn set_desktop_behavior_preserved(&mut self, preserved: bool) {
        self.desktop_behavior_preserved = preserved;
        if preserved {
            self.add_class(class_name::BEHAVIOR_PRESERVED);
        } else {
            self.remove_class(class_name::BEHAVIOR_PRESERVED);
        }
        self.emit(ConfigurationEvent::DesktopBehavior(preserved));
    }

    #[must_use]
    pub fn is_draggable(&self) -> bool {
        self.draggable
    }

    /// `save_state` persists the flag for [`Self::restore_draggable_state`].
    pub fn set_draggable(&mut self, enabled: bool, save_state: bool) {
        self.draggable = enabled;
        if save_state {
            self.saved.draggable = enabled;
        }
        self.emit(ConfigurationEvent::Draggable(enabled));
    }

    pub fn restore_draggable_state(&mut self) {
        self.set_draggable(self.saved.draggable, false);
    }

    #[must_use]
    pub fn is_resizable(&self) -> bool {
        self.resizable
    }

    /// `save_state` persists the flag for [`Self::restore_resizable_state`].
    pub fn set_resizable(&mut self, enabled: bool, save_state: bool) {
        self.resizable = enabled;
        if save_state {
            self.saved.resizable = enabled;
        }
        self.emit(ConfigurationEvent::Resizable(enabled));
    }

    pub fn restore_resizable_state(&mut self) {
        self.set_resizable(self.saved.resizable, false);
    }

    // -- maximize / collapse ---------------------------------------------------

    #[must_use]
    pub fn is_maximized(&self) -> bool {
        self.maximized
    }

    /// Enter or leave maximized mode.
    pub fn set_maximized(&mut self, maximized: bool) {
        #[cfg(feature = "tracing")]
        tracing::trace!(maximized, collapsed = self.collapsed, "configuration.maximize");

        if maximized {
            self.set_draggable(false, false);
            self.set_resizable(false, false);
            self.set_max_height(Some(Dimension::FULL), false);
            if !self.collapsed {
                self.set_min_height(Some(Dimension::FULL), false);
            }
            self.set_min_width(Some(Dimension::FULL), false);
            self.set_max_width(Some(Dimension::FULL), false);
        } else {
            self.restore_draggable_state();
            self.restore_max_height();
            if !self.collapsed {
                self.restore_resizable_state();
                self.restore_min_height();
            }
            self.restore_min_width();
            self.restore_max_width();
        }

        if !self.draggable {
            self.set_position_to_screen_center(true);
        }

        self.maximized = maximized;
        if maximized {
            self.add_class(class_name::FULLSCREEN);
        } else {
            self.remove_class(class_name::FULLSCREEN);
        }
        self.emit(ConfigurationEvent::Fullscreen(maximized));
    }

    pub fn toggle_maximize(&mut self) {
        self.set_maximized(!self.maximized);
    }

    #[must_use]
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Collapse to the title row or expand back.
    pub fn set_collapsed(&mut self, collapsed: bool) {
        #[cfg(feature = "tracing")]
        tracing::trace!(collapsed, maximized = self.maximized, "configuration.collapse");

        self.collapsed = collapsed;
        if collapsed {
            let row = Dimension::px(self.policy.collapsed_height);
            self.set_height(Some(row), false);
            self.set_min_height(Some(row), false);
            self.set_resizable(false, false);
            self.add_class(class_name::COLLAPSED);
        } else {
            self.restore_height();
            self.restore_min_height();
            if self.maximized {
                self.set_min_height(Some(Dimension::FULL), false);
            } else {
                self.restore_resizable_state();
            }
            self.remove_class(class_name::COLLAPSED);
        }
        self.emit(ConfigurationEvent::Collapse(collapsed));
    }

    pub fn toggle_collapse(&mut self) {
        self.set_collapsed(!self.collapsed);
    }

    // -- buttons ---------------------------------------------------------------

    #[must_use]
    pub fn is_close_button_visible(&self) -> bool {
        self.close_button_visible
    }

    pub fn set_close_button_visible(&mut self, visible: bool) {
        self.close_button_visible = visible;
    }

    /// Enabled and not constrained by a max width or max height.
    #[must_use]
    pub fn is_maximize_button_visible(&self) -> bool {
        self.maximize_button_enabled && self.max_width.is_none() && self.max_height.is_none()
    }

    pub fn set_maximize_button_visible(&mut self, visible: bool) {
        self.maximize_button_enabled = visible;
    }

    #[must_use]
    pub fn is_collapse_button_visible(&self) -> bool {
        self.collapse_button_visible
    }

    pub fn set_collapse_button_visible(&mut self, visible: bool) {
        self.collapse_button_visible = visible;
    }

    // -- classes ---------------------------------------------------------------

    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.class_names.contains(name)
    }

    /// Class names, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.class_names.iter().cloned().collect();
        names.sort_unstable();
        names
    }

    pub fn add_class(&mut self, name: &str) {
        self.class_names.insert(name.to_owned());
        self.emit(ConfigurationEvent::ClassAdded(name.to_owned()));
    }

    pub fn remove_class(&mut self, name: &str) {
        self.class_names.remove(name);
        self.emit(ConfigurationEvent::ClassRemoved(name.to_owned()));
    }

    // -- dimensions ------------------------------------------------------------

    #[must_use]
    pub fn height(&self) -> Option<Dimension> {
        self.height
    }

    /// Seeds `min_height` from the same value when no positive min is set.
    pub fn set_height(&mut self, height: Option<Dimension>, save_state: bool) {
        if !self.min_height.is_some_and(|d| !d.is_zero()) {
            self.set_min_height(height, save_state);
        }
        if save_state {
            self.saved.height = height;
        }
        self.height = height;
        if let Some(d) = height.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::Height(d));
        }
    }

    pub fn restore_height(&mut self) {
        self.set_height(self.saved.height, true);
    }

    #[must_use]
    pub fn min_height(&self) -> Option<Dimension> {
        self.min_height
    }

    pub fn set_min_height(&mut self, height: Option<Dimension>, save_state: bool) {
        self.min_height = height;
        if save_state && self.init_min_height.is_none() {
            self.init_min_height = height;
        }
        if save_state {
            self.saved.min_height = height;
        }
        if let Some(d) = height.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::MinHeight(d));
        }
    }

    pub fn restore_min_height(&mut self) {
        self.set_min_height(self.saved.min_height, true);
    }

    #[must_use]
    pub fn max_height(&self) -> Option<Dimension> {
        self.max_height
    }

    pub fn set_max_height(&mut self, height: Option<Dimension>, save_state: bool) {
        self.max_height = height;
        if save_state && self.init_max_height.is_none() {
            self.init_max_height = height;
        }
        if save_state {
            self.saved.max_height = height;
        }
        if let Some(d) = height.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::MaxHeight(d));
        }
    }

    pub fn restore_max_height(&mut self) {
        self.set_max_height(self.saved.max_height, true);
    }

    #[must_use]
    pub fn width(&self) -> Option<Dimension> {
        self.width
    }

    /// Seeds `min_width` from the same value when no positive min is set.
    pub fn set_width(&mut self, width: Option<Dimension>, save_state: bool) {
        if !self.min_width.is_some_and(|d| !d.is_zero()) {
            self.set_min_width(width, save_state);
        }
        if save_state {
            self.saved.width = width;
        }
        self.width = width;
        if let Some(d) = width.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::Width(d));
        }
    }

    pub fn restore_width(&mut self) {
        self.set_width(self.saved.width, true);
    }

    #[must_use]
    pub fn min_width(&self) -> Option<Dimension> {
        self.min_width
    }

    pub fn set_min_width(&mut self, width: Option<Dimension>, save_state: bool) {
        self.min_width = width;
        if save_state && self.init_min_width.is_none() {
            self.init_min_width = width;
        }
        if save_state {
            self.saved.min_width = width;
        }
        if let Some(d) = width.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::MinWidth(d));
        }
    }

    pub fn restore_min_width(&mut self) {
        self.set_min_width(self.saved.min_width, true);
    }

    #[must_use]
    pub fn max_width(&self) -> Option<Dimension> {
        self.max_width
    }

    pub fn set_max_width(&mut self, width: Option<Dimension>, save_state: bool) {
        self.max_width = width;
        if save_state && self.init_max_width.is_none() {
            self.init_max_width = width;
        }
        if save_state {
            self.saved.max_width = width;
        }
        if let Some(d) = width.filter(Dimension::is_positive) {
            self.emit(ConfigurationEvent::MaxWidth(d));
        }
    }

    pub fn restore_max_width(&mut self) {
        self.set_max_width(self.saved.max_width, true);
    }

    /// First-ever persisted min sizes. Writes with `save_state == false`
    /// are never captured.
    #[must_use]
    pub fn initial_min_size(&self) -> (Option<Dimension>, Option<Dimension>) {
        (self.init_min_width, self.init_min_height)
    }

    /// First-ever persisted max sizes.
    #[must_use]
    pub fn initial_max_size(&self) -> (Option<Dimension>, Option<Dimension>) {
        (self.init_max_width, self.init_max_height)
    }

    /// Reapply the first-ever min sizes, if any were captured.
    pub fn restore_initial_min_size(&mut self) {
        if let Some(height) = self.init_min_height {
            self.set_min_height(Some(height), true);
        }
        if let Some(width) = self.init_min_width {
            self.set_min_width(Some(width), true);
        }
    }

    /// Drop both min sizes. Used on compact viewports.
    pub fn clear_min_size(&mut self) {
        self.set_min_height(None, true);
        self.set_min_width(None, true);
    }

    #[must_use]
    pub fn saved_state(&self) -> &SavedState {
        &self.saved
    }

    // -- position --------------------------------------------------------------

    #[must_use]
    pub fn left_position(&self) -> Option<Dimension> {
        self.left
    }

    #[must_use]
    pub fn top_position(&self) -> Option<Dimension> {
        self.top
    }

    pub fn set_left_position(&mut self, left: f64) {
        self.left = Some(Dimension::px(self.check_bound_box(Axis::Horizontal, left)));
        self.emit_position();
    }

    pub fn set_top_position(&mut self, top: f64) {
        self.top = Some(Dimension::px(self.check_bound_box(Axis::Vertical, top)));
        self.emit_position();
    }

    /// Set both coordinates with a single event.
    pub fn set_position(&mut self, top: f64, left: f64) {
        self.top = Some(Dimension::px(self.check_bound_box(Axis::Vertical, top)));
        self.left = Some(Dimension::px(self.check_bound_box(Axis::Horizontal, left)));
        self.emit_position();
    }

    /// Re-run clamping on the stored position against the current viewport.
    pub fn reclamp_position(&mut self) {
        let top = self.top.map(|d| self.check_bound_box(Axis::Vertical, d.value));
        let left = self.left.map(|d| self.check_bound_box(Axis::Horizontal, d.value));
        if top.is_none() && left.is_none() {
            return;
        }
        self.top = top.map(Dimension::px);
        self.left = left.map(Dimension::px);
        self.emit_position();
    }

    fn emit_position(&self) {
        self.emit(ConfigurationEvent::Position {
            top: self.top,
            left: self.left,
        });
    }

    #[must_use]
    pub fn order(&self) -> Option<u32> {
        self.stack_order
    }

    /// Plain storage; stacking policy lives in the active tracker.
    pub fn set_order(&mut self, order: u32) {
        self.stack_order = Some(order);
    }

    /// Clamp a coordinate on `axis` against the current viewport.
    ///
    /// On mobile viewports (narrower than the mobile breakpoint, desktop
    /// behaviour not preserved) the dialog is centered. Otherwise the left
    /// edge stays within `[-element_width + visible_sliver, width - grab_margin]`
    /// and the top edge within `[0, height - grab_margin]`.
    #[must_use]
    pub fn check_bound_box(&self, axis: Axis, position: f64) -> f64 {
        let bound = self.viewport;
        let mobile = self.policy.is_mobile(bound.width) && !self.desktop_behavior_preserved;
        let margin = self.policy.grab_margin;

        match axis {
            Axis::Horizontal => {
                let element = first_set([self.width, self.max_width, self.min_width]);
                if mobile {
                    return bound.width / 2.0 - element.unwrap_or(0.0) / 2.0;
                }
                if position > bound.width - margin {
                    return bound.width - margin;
                }
                if let Some(width) = element {
                    let floor = -width + self.policy.visible_sliver;
                    if position < floor {
                        return floor;
                    }
                }
                position
            }
            Axis::Vertical => {
                let element = first_set([self.height, self.max_height, self.min_height]);
                if mobile {
                    return (bound.height / 2.0 - element.unwrap_or(0.0) / 2.0).max(0.0);
                }
                if position > bound.height - margin {
                    return bound.height - margin;
                }
                position.max(0.0)
            }
        }
    }

    // -- snapshot --------------------------------------------------------------

    #[must_use]
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        ConfigurationSnapshot {
            visible: self.visible,
            overlay_visible: self.overlay_visible,
            position_to_screen_center: self.position_to_screen_center,
            draggable: self.draggable,
            resizable: self.resizable,
            maximized: self.maximized,
            collapsed: self.collapsed,
            desktop_behavior_preserved: self.desktop_behavior_preserved,
            close_on_esc: self.close_on_esc,
            close_on_document_click: self.close_on_document_click,
            close_button_visible: self.close_button_visible,
            maximize_button_visible: self.is_maximize_button_visible(),
            collapse_button_visible: self.collapse_button_visible,
            height: self.height,
            min_height: self.min_height,
            max_height: self.max_height,
            width: self.width,
            min_width: self.min_width,
            max_width: self.max_width,
            left: self.left,
            top: self.top,
            stack_order: self.stack_order,
            class_names: self.class_names(),
        }
    }
}

/// First non-zero value in priority order.
fn first_set<const N: usize>(candidates: [Option<Dimension>; N]) -> Option<f64> {
    candidates
        .into_iter()
        .flatten()
        .find(|d| !d.is_zero())
        .map(|d| d.value)
}

/// A [`Configuration`] shared between a dialog handle and its collaborators.
///
/// Mutations go through [`SharedConfiguration::update`], which holds event
/// delivery until the mutable borrow is released. Subscribers may therefore
/// read the configuration from inside their callbacks.
#[derive(Clone)]
pub struct SharedConfiguration {
    inner: Rc<RefCell<Configuration>>,
    changes: ChangeStream<ConfigurationEvent>,
}

impl std::fmt::Debug for SharedConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.inner.try_borrow() {
            Ok(config) => std::fmt::Debug::fmt(&*config, f),
            Err(_) => f.write_str("SharedConfiguration(<borrowed>)"),
        }
    }
}

impl SharedConfiguration {
    #[must_use]
    pub fn new(config: Configuration) -> Self {
        let changes = config.changes().clone();
        Self {
            inner: Rc::new(RefCell::new(config)),
            changes,
        }
    }

    /// Mutate through the configuration's setters; events are delivered
    /// after `f` returns and the borrow is released.
    pub fn update<R>(&self, f: impl FnOnce(&mut Configuration) -> R) -> R {
        let _batch = self.changes.batch();
        let mut config = self.inner.borrow_mut();
        f(&mut config)
    }

    /// Read access.
    pub fn read<R>(&self, f: impl FnOnce(&Configuration) -> R) -> R {
        f(&self.inner.borrow())
    }

    /// Borrow for inspection. Do not hold across [`Self::update`].
    #[must_use]
    pub fn borrow(&self) -> Ref<'_, Configuration> {
        self.inner.borrow()
    }

    #[must_use]
    pub fn changes(&self) -> &ChangeStream<ConfigurationEvent> {
        &self.changes
    }

    pub fn subscribe(&self, callback: impl Fn(&ConfigurationEvent) + 'static) -> Subscription {
        self.changes.subscribe(callback)
    }

    #[must_use]
    pub fn snapshot(&self) -> ConfigurationSnapshot {
        self.inner.borrow().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ConfigurationEvent as Ev;

    fn recorded(config: &Configuration) -> (Rc<RefCell<Vec<Ev>>>, Subscription) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&log);
        let sub = config.subscribe(move |e| sink.borrow_mut().push(e.clone()));
        (log, sub)
    }

    fn desktop() -> Configuration {
        let mut config = Configuration::default();
        config.set_viewport(BoundBox::new(1280.0, 800.0));
        config
    }

    #[test]
    fn defaults() {
        let config = Configuration::default();
        assert!(config.is_visible());
        assert!(config.is_overlay_visible());
        assert!(config.is_close_button_visible());
        assert!(!config.is_draggable());
        assert!(!config.is_resizable());
        assert!(!config.is_close_on_esc_enabled());
        assert!(!config.is_maximize_button_visible());
        assert_eq!(config.order(), None);
        assert!(config.class_names().is_empty());
    }

    #[test]
    fn overlay_toggles_without_overlay_tag() {
        let mut config = Configuration::default();
        config.set_overlay_visible(false);
        assert!(config.has_class(class_name::WITHOUT_OVERLAY));
        config.set_overlay_visible(true);
        assert!(!config.has_class(class_name::WITHOUT_OVERLAY));
    }

    #[test]
    fn class_events_emit_even_without_state_change() {
        let mut config = Configuration::default();
        let (log, _sub) = recorded(&config);
        config.add_class("x");
        config.add_class("x");
        config.remove_class("y");
        assert_eq!(
            *log.borrow(),
            vec![
                Ev::ClassAdded("x".into()),
                Ev::ClassAdded("x".into()),
                Ev::ClassRemoved("y".into()),
            ]
        );
        assert_eq!(config.class_names(), vec!["x".to_owned()]);
    }

    #[test]
    fn height_seeds_min_height() {
        let mut config = Configuration::default();
        config.set_height(Some(Dimension::px(300.0)), true);
        assert_eq!(config.min_height(), Some(Dimension::px(300.0)));
        config.set_height(Some(Dimension::px(500.0)), true);
        assert_eq!(config.min_height(), Some(Dimension::px(300.0)));
        assert_eq!(config.initial_min_size().1, Some(Dimension::px(300.0)));
    }

    #[test]
    fn zero_and_unset_dimensions_are_stored_but_not_broadcast() {
        let mut config = Configuration::default();
        let (log, _sub) = recorded(&config);
        config.set_width(Some(Dimension::px(0.0)), true);
        config.set_max_height(None, true);
        assert!(log.borrow().is_empty());
        assert_eq!(config.width(), Some(Dimension::px(0.0)));

        config.set_max_height(Some(Dimension::px(10.0)), true);
        assert_eq!(*log.borrow(), vec![Ev::MaxHeight(Dimension::px(10.0))]);
    }

    #[test]
    fn max_constraint_hides_maximize_button() {
        let mut config = Configuration::default();
        config.set_maximize_button_visible(true);
        assert!(config.is_maximize_button_visible());
        config.set_max_width(Some(Dimension::px(500.0)), true);
        assert!(!config.is_maximize_button_visible());
        config.set_max_width(None, true);
        config.set_max_height(Some(Dimension::px(500.0)), true);
        assert!(!config.is_maximize_button_visible());
    }

    #[test]
    fn maximize_pins_and_restores() {
        let mut config = desktop();
        config.set_height(Some(Dimension::px(300.0)), true);
        config.set_width(Some(Dimension::px(400.0)), true);
        config.set_draggable(true, true);
        config.set_resizable(true, true);
        let before = config.snapshot();

        config.set_maximized(true);
        assert!(!config.is_draggable());
        assert!(!config.is_resizable());
        assert!(config.is_position_to_screen_center_enabled());
        assert_eq!(config.max_height(), Some(Dimension::FULL));
        assert_eq!(config.min_height(), Some(Dimension::FULL));
        assert_eq!(config.min_width(), Some(Dimension::FULL));
        assert_eq!(config.max_width(), Some(Dimension::FULL));
        assert!(config.has_class(class_name::FULLSCREEN));

        config.set_maximized(false);
        let after = config.snapshot();
        assert_eq!(after.height, before.height);
        assert_eq!(after.min_height, before.min_height);
        assert_eq!(after.max_height, before.max_height);
        assert_eq!(after.width, before.width);
        assert_eq!(after.min_width, before.min_width);
        assert_eq!(after.max_width, before.max_width);
        assert_eq!(after.resizable, before.resizable);
        assert_eq!(after.draggable, before.draggable);
        assert!(!config.has_class(class_name::FULLSCREEN));
    }

    #[test]
    fn maximize_emits_fullscreen_last() {
        let mut config = desktop();
        let (log, _sub) = recorded(&config);
        config.set_maximized(true);
        let log = log.borrow();
        assert_eq!(log.last(), Some(&Ev::Fullscreen(true)));
        assert!(log.contains(&Ev::Draggable(false)));
        assert!(log.contains(&Ev::ScreenCenter(true)));
    }

    #[test]
    fn maximize_keeps_collapsed_min_height() {
        let mut config = desktop();
        config.set_collapsed(true);
        config.set_maximized(true);
        assert_eq!(config.min_height(), Some(Dimension::px(28.0)));
        config.set_maximized(false);
        assert!(!config.is_resizable());
        assert_eq!(config.height(), Some(Dimension::px(28.0)));
    }

    #[test]
    fn collapse_round_trip() {
        let mut config = desktop();
        config.set_height(Some(Dimension::px(300.0)), true);
        config.set_width(Some(Dimension::px(400.0)), true);
        config.set_resizable(true, true);
        let before = config.snapshot();

        config.set_collapsed(true);
        assert_eq!(config.height(), Some(Dimension::px(28.0)));
        assert_eq!(config.min_height(), Some(Dimension::px(28.0)));
        assert!(!config.is_resizable());
        assert!(config.has_class(class_name::COLLAPSED));

        config.toggle_collapse();
        let after = config.snapshot();
        assert_eq!(after.height, before.height);
        assert_eq!(after.min_height, before.min_height);
        assert_eq!(after.width, before.width);
        assert_eq!(after.min_width, before.min_width);
        assert_eq!(after.resizable, before.resizable);
        assert_eq!(after.draggable, before.draggable);
        assert!(!config.has_class(class_name::COLLAPSED));
    }

    #[test]
    fn collapse_without_min_height_leaves_it_unset() {
        let mut config = desktop();
        config.set_width(Some(Dimension::px(400.0)), true);
        let before = config.snapshot();

        config.set_collapsed(true);
        config.set_collapsed(false);
        assert_eq!(config.min_height(), None);
        assert_eq!(config.height(), None);
        assert_eq!(config.snapshot().min_height, before.min_height);
        assert_eq!(config.initial_min_size().1, None);

        // The title-row height must not come back as an "initial" min.
        config.clear_min_size();
        config.restore_initial_min_size();
        assert_eq!(config.min_height(), None);
        assert_eq!(config.min_width(), Some(Dimension::px(400.0)));
    }

    #[test]
    fn maximize_does_not_capture_initial_min_sizes() {
        let mut config = desktop();
        config.set_maximized(true);
        config.set_maximized(false);
        assert_eq!(config.initial_min_size(), (None, None));
        assert_eq!(config.initial_max_size(), (None, None));
        assert_eq!(config.min_height(), None);
        assert_eq!(config.min_width(), None);
    }

    #[test]
    fn expanding_while_maximized_repins_min_height() {
        let mut config = desktop();
        config.set_resizable(true, true);
        config.set_maximized(true);
        config.set_collapsed(true);
        config.set_collapsed(false);
        assert_eq!(config.min_height(), Some(Dimension::FULL));
        assert!(!config.is_resizable());
    }

    #[test]
    fn horizontal_clamp_keeps_grab_margin_and_sliver() {
        let mut config = desktop();
        config.set_width(Some(Dimension::px(400.0)), true);
        assert_eq!(config.check_bound_box(Axis::Horizontal, 5000.0), 1250.0);
        assert_eq!(config.check_bound_box(Axis::Horizontal, -1000.0), -310.0);
        assert_eq!(config.check_bound_box(Axis::Horizontal, 120.0), 120.0);
    }

    #[test]
    fn horizontal_floor_needs_an_element_size() {
        let config = desktop();
        assert_eq!(config.check_bound_box(Axis::Horizontal, -1000.0), -1000.0);
    }

    #[test]
    fn element_size_falls_back_to_max_then_min() {
        let mut config = desktop();
        config.set_min_width(Some(Dimension::px(200.0)), true);
        assert_eq!(config.check_bound_box(Axis::Horizontal, -1000.0), -110.0);
        config.set_max_width(Some(Dimension::px(300.0)), true);
        assert_eq!(config.check_bound_box(Axis::Horizontal, -1000.0), -210.0);
    }

    #[test]
    fn vertical_clamp() {
        let config = desktop();
        assert_eq!(config.check_bound_box(Axis::Vertical, -50.0), 0.0);
        assert_eq!(config.check_bound_box(Axis::Vertical, 900.0), 770.0);
    }

    #[test]
    fn mobile_centers_unless_desktop_preserved() {
        let mut config = Configuration::default();
        config.set_viewport(BoundBox::new(400.0, 700.0));
        config.set_width(Some(Dimension::px(300.0)), true);
        config.set_height(Some(Dimension::px(900.0)), true);
        assert_eq!(config.check_bound_box(Axis::Horizontal, 0.0), 50.0);
        assert_eq!(config.check_bound_box(Axis::Vertical, 10.0), 0.0);

        config.set_desktop_behavior_preserved(true);
        assert!(config.has_class(class_name::BEHAVIOR_PRESERVED));
        assert_eq!(config.check_bound_box(Axis::Horizontal, 0.0), 0.0);
    }

    #[test]
    fn set_position_clamps_and_emits_once() {
        let mut config = desktop();
        let (log, _sub) = recorded(&config);
        config.set_position(-10.0, 2000.0);
        assert_eq!(
            *log.borrow(),
            vec![Ev::Position {
                top: Some(Dimension::px(0.0)),
                left: Some(Dimension::px(1250.0)),
            }]
        );
    }

    #[test]
    fn single_axis_setters_report_both_coordinates() {
        let mut config = desktop();
        config.set_top_position(40.0);
        let (log, _sub) = recorded(&config);
        config.set_left_position(60.0);
        assert_eq!(
            *log.borrow(),
            vec![Ev::Position {
                top: Some(Dimension::px(40.0)),
                left: Some(Dimension::px(60.0)),
            }]
        );
    }

    #[test]
    fn reclamp_after_viewport_shrinks() {
        let mut config = desktop();
        config.set_position(700.0, 1200.0);
        config.set_viewport(BoundBox::new(1000.0, 600.0));
        config.reclamp_position();
        assert_eq!(config.left_position(), Some(Dimension::px(970.0)));
        assert_eq!(config.top_position(), Some(Dimension::px(570.0)));
    }

    #[test]
    fn min_size_clear_and_restore() {
        let mut config = Configuration::default();
        config.set_min_width(Some(Dimension::px(320.0)), true);
        config.set_min_height(Some(Dimension::px(200.0)), true);
        config.set_min_width(Some(Dimension::px(500.0)), true);
        config.clear_min_size();
        assert_eq!(config.min_width(), None);
        config.restore_initial_min_size();
        assert_eq!(config.min_width(), Some(Dimension::px(320.0)));
        assert_eq!(config.min_height(), Some(Dimension::px(200.0)));
    }

    #[test]
    fn order_is_plain_storage() {
        let mut config = Configuration::default();
        let (log, _sub) = recorded(&config);
        config.set_order(1001);
        assert_eq!(config.order(), Some(1001));
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn shared_update_delivers_after_borrow_release() {
        let shared = SharedConfiguration::new(Configuration::default());
        let reader = shared.clone();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let _sub = shared.subscribe(move |e| {
            if let Ev::Draggable(_) = e {
                // Reading inside a subscriber must not conflict with the writer.
                sink.borrow_mut().push(reader.read(Configuration::is_draggable));
            }
        });
        shared.update(|c| {
            c.set_draggable(true, true);
            c.set_draggable(false, true);
        });
        assert_eq!(*seen.borrow(), vec![false, false]);
    }
}
