//! Dimension value type.
//!
//! A [`Dimension`] is a `(value, units)` pair. `None` at the use site means
//! "unset": the presentation surface picks an intrinsic size.

use std::fmt;
use std::str::FromStr;

use crate::error::ParseUnitsError;

/// Units a [`Dimension`] is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DimensionUnits {
    /// Absolute pixels (`px`).
    #[default]
    Pixel,
    /// Percentage of the containing box (`%`).
    Percentage,
}

impl DimensionUnits {
    /// CSS-style suffix for these units.
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Pixel => "px",
            Self::Percentage => "%",
        }
    }
}

impl FromStr for DimensionUnits {
    type Err = ParseUnitsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "px" => Ok(Self::Pixel),
            "%" => Ok(Self::Percentage),
            other => Err(ParseUnitsError::new(other)),
        }
    }
}

/// An immutable size or offset.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dimension {
    pub value: f64,
    pub units: DimensionUnits,
}

impl Dimension {
    /// Full extent of the containing box.
    pub const FULL: Self = Self::percent(100.0);

    #[must_use]
    pub const fn new(value: f64, units: DimensionUnits) -> Self {
        Self { value, units }
    }

    /// Pixel dimension.
    #[must_use]
    pub const fn px(value: f64) -> Self {
        Self::new(value, DimensionUnits::Pixel)
    }

    /// Percentage dimension.
    #[must_use]
    pub const fn percent(value: f64) -> Self {
        Self::new(value, DimensionUnits::Percentage)
    }

    /// Whether the value is strictly positive.
    ///
    /// Setters only broadcast changes to positive dimensions.
    #[inline]
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.value > 0.0
    }

    /// Whether the value is zero.
    #[inline]
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value == 0.0
    }
}

/// Bare numbers are pixels.
impl From<f64> for Dimension {
    fn from(value: f64) -> Self {
        Self::px(value)
    }
}

impl From<u32> for Dimension {
    fn from(value: u32) -> Self {
        Self::px(f64::from(value))
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.units.suffix())
    }
}

impl FromStr for Dimension {
    type Err = ParseUnitsError;

    /// Parses `"300px"`, `"50%"` or a bare number (pixels).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (number, units) = if let Some(n) = s.strip_suffix("px") {
            (n, DimensionUnits::Pixel)
        } else if let Some(n) = s.strip_suffix('%') {
            (n, DimensionUnits::Percentage)
        } else {
            (s, DimensionUnits::Pixel)
        };
        let value = number
            .trim()
            .parse::<f64>()
            .map_err(|_| ParseUnitsError::new(s))?;
        Ok(Self::new(value, units))
    }
}
