//! Viewport and layout geometry.

/// The viewport rectangle dialogs are clamped and centered within.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundBox {
    pub width: f64,
    pub height: f64,
}

impl BoundBox {
    /// A bound box that never clamps. Used until a host reports its viewport.
    pub const UNBOUNDED: Self = Self {
        width: f64::INFINITY,
        height: f64::INFINITY,
    };

    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both extents are finite.
    #[must_use]
    pub fn is_bounded(&self) -> bool {
        self.width.is_finite() && self.height.is_finite()
    }
}

impl Default for BoundBox {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

/// Top-left corner of a rendered dialog, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Offset {
    pub left: f64,
    pub top: f64,
}

impl Offset {
    #[must_use]
    pub const fn new(left: f64, top: f64) -> Self {
        Self { left, top }
    }
}

/// Rendered size of a dialog, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}
