#![forbid(unsafe_code)]

//! Tunable constants and focus selectors for the dialog stack.
//!
//! [`DialogSettings`] groups the layout policy and the focus-trap selectors
//! every dialog of a service shares. With the `policy-config` feature it can
//! be loaded from TOML or JSON:
//!
//! ```toml
//! [policy]
//! default_z_index = 2000
//! cascade_offset = 24
//!
//! [focus]
//! enable_tab = false
//! ```
//!
//! # Defaults
//!
//! `DialogSettings::default()` reproduces the stock layout rules: z-index
//! floor 1000, 30px cascade, mobile centering under 760px, a 30px grab
//! margin, a 90px visible sliver, a 28px collapsed row, compact mode under
//! 600px and a 150ms press-and-hold before dragging.

#[cfg(feature = "policy-config")]
use std::path::Path;
use std::time::Duration;

#[cfg(feature = "policy-config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "policy-config")]
use crate::error::SettingsError;

/// Numeric layout and stacking policy.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct DialogPolicy {
    /// Lowest stack order an activated dialog can receive.
    pub default_z_index: u32,
    /// Right/down offset for cascaded placement, in pixels.
    pub cascade_offset: f64,
    /// Viewports narrower than this center every dialog.
    pub mobile_breakpoint: f64,
    /// Minimum distance kept between a dialog's left/top edge and the
    /// right/bottom viewport edge.
    pub grab_margin: f64,
    /// Width that must stay visible when a dialog is dragged off the left edge.
    pub visible_sliver: f64,
    /// Height of a collapsed dialog, in pixels.
    pub collapsed_height: f64,
    /// At or below this viewport width, dragging and resizing are disabled
    /// and min sizes are cleared.
    pub compact_breakpoint: f64,
    /// Press-and-hold time before a drag starts, in milliseconds.
    pub drag_hold_ms: u64,
}

impl Default for DialogPolicy {
    fn default() -> Self {
        Self {
            default_z_index: 1000,
            cascade_offset: 30.0,
            mobile_breakpoint: 760.0,
            grab_margin: 30.0,
            visible_sliver: 90.0,
            collapsed_height: 28.0,
            compact_breakpoint: 600.0,
            drag_hold_ms: 150,
        }
    }
}

impl DialogPolicy {
    #[must_use]
    pub fn drag_hold(&self) -> Duration {
        Duration::from_millis(self.drag_hold_ms)
    }

    /// Whether a viewport this wide uses the centered mobile layout.
    #[must_use]
    pub fn is_mobile(&self, viewport_width: f64) -> bool {
        viewport_width < self.mobile_breakpoint
    }

    /// Whether a viewport this wide allows pointer dragging and resizing.
    #[must_use]
    pub fn allows_pointer_layout(&self, viewport_width: f64) -> bool {
        viewport_width > self.compact_breakpoint
    }
}

/// Focus-trap selectors handed to presentation surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct FocusSettings {
    /// Elements that can receive focus inside a dialog.
    pub focusable_selectors: String,
    /// Elements skipped by the focus trap.
    pub ignore_selectors: String,
    /// Elements preferred by auto-focus, in priority order.
    pub autofocus_selectors: String,
    /// Whether Tab / Shift-Tab cycle focus inside the active dialog.
    pub enable_tab: bool,
}

impl Default for FocusSettings {
    fn default() -> Self {
        Self {
            focusable_selectors: "a[href], area[href], input:not([disabled]), select:not([disabled]), \
                 textarea:not([disabled]), button:not([disabled]), iframe, object, embed, \
                 *[tabindex], *[contenteditable]"
                .to_owned(),
            ignore_selectors: ".modal-header-btn, .resize-handle".to_owned(),
            autofocus_selectors: "[autofocus], .primary-action".to_owned(),
            enable_tab: true,
        }
    }
}

/// Everything a dialog service shares with its dialogs.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "policy-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "policy-config", serde(default))]
pub struct DialogSettings {
    pub policy: DialogPolicy,
    pub focus: FocusSettings,
}

impl DialogSettings {
    /// Load from a TOML string, rejecting invalid values.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = toml::from_str(s)?;
        settings.into_validated()
    }

    /// Load from a TOML file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&content)
    }

    /// Load from a JSON string, rejecting invalid values.
    #[cfg(feature = "policy-config")]
    pub fn from_json_str(s: &str) -> Result<Self, SettingsError> {
        let settings: Self = serde_json::from_str(s)?;
        settings.into_validated()
    }

    /// Load from a JSON file on disk.
    #[cfg(feature = "policy-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&content)
    }

    /// Serialize to a TOML string.
    #[cfg(feature = "policy-config")]
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    #[cfg(feature = "policy-config")]
    fn into_validated(self) -> Result<Self, SettingsError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(SettingsError::Validation(errors))
        }
    }

    /// Validate all parameters are within acceptable ranges.
    ///
    /// Returns a list of validation errors. An empty list means the settings
    /// are valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let p = &self.policy;

        if p.cascade_offset < 0.0 || !p.cascade_offset.is_finite() {
            errors.push(format!(
                "policy.cascade_offset must be finite and >= 0, got {}",
                p.cascade_offset
            ));
        }
        for (name, value) in [
            ("policy.grab_margin", p.grab_margin),
            ("policy.visible_sliver", p.visible_sliver),
            ("policy.collapsed_height", p.collapsed_height),
        ] {
            if value <= 0.0 || !value.is_finite() {
                errors.push(format!("{name} must be finite and > 0, got {value}"));
            }
        }
        if p.compact_breakpoint < 0.0 {
            errors.push(format!(
                "policy.compact_breakpoint must be >= 0, got {}",
                p.compact_breakpoint
            ));
        }
        if p.mobile_breakpoint < p.compact_breakpoint {
            errors.push(format!(
                "policy.mobile_breakpoint ({}) must not be below policy.compact_breakpoint ({})",
                p.mobile_breakpoint, p.compact_breakpoint
            ));
        }
        if self.focus.focusable_selectors.trim().is_empty() {
            errors.push("focus.focusable_selectors must not be empty".into());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(DialogSettings::default().validate().is_empty());
    }

    #[test]
    fn default_policy_constants() {
        let p = DialogPolicy::default();
        assert_eq!(p.default_z_index, 1000);
        assert_eq!(p.cascade_offset, 30.0);
        assert_eq!(p.drag_hold(), Duration::from_millis(150));
        assert!(p.is_mobile(759.0));
        assert!(!p.is_mobile(760.0));
        assert!(!p.allows_pointer_layout(600.0));
        assert!(p.allows_pointer_layout(601.0));
    }

    #[test]
    fn validate_reports_every_problem() {
        let mut settings = DialogSettings::default();
        settings.policy.grab_margin = 0.0;
        settings.policy.mobile_breakpoint = 100.0;
        settings.focus.focusable_selectors = "  ".into();
        let errors = settings.validate();
        assert_eq!(errors.len(), 3, "{errors:?}");
        assert!(errors[0].starts_with("policy.grab_margin"));
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn toml_overrides_merge_with_defaults() {
        let settings = DialogSettings::from_toml_str(
            "[policy]\ndefault_z_index = 2000\n\n[focus]\nenable_tab = false\n",
        )
        .unwrap();
        assert_eq!(settings.policy.default_z_index, 2000);
        assert_eq!(settings.policy.cascade_offset, 30.0);
        assert!(!settings.focus.enable_tab);
    }

    #[cfg(feature = "policy-config")]
    #[test]
    fn invalid_json_values_are_rejected() {
        let err = DialogSettings::from_json_str(r#"{"policy":{"collapsed_height":-1}}"#)
            .unwrap_err();
        assert_eq!(err.validation_messages().len(), 1);
    }
}
