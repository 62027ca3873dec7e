//! Viewport inset margins

use serde::{Deserialize, Serialize};

/// Insets from the edges of the map view, in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Padding {
    top: f64,
    right: f64,
    bottom: f64,
    left: f64,
}

impl Padding {
    /// No padding on any side
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create padding in CSS order: top, right, bottom, left
    #[must_use]
    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// The same inset on all four sides
    #[must_use]
    pub const fn uniform(value: f64) -> Self {
        Self::new(value, value, value, value)
    }

    /// Top inset
    #[must_use]
    pub const fn top(&self) -> f64 {
        self.top
    }

    /// Right inset
    #[must_use]
    pub const fn right(&self) -> f64 {
        self.right
    }

    /// Bottom inset
    #[must_use]
    pub const fn bottom(&self) -> f64 {
        self.bottom
    }

    /// Left inset
    #[must_use]
    pub const fn left(&self) -> f64 {
        self.left
    }

    /// Sum of left and right insets
    #[must_use]
    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    /// Sum of top and bottom insets
    #[must_use]
    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

impl From<[f64; 4]> for Padding {
    fn from([top, right, bottom, left]: [f64; 4]) -> Self {
        Self::new(top, right, bottom, left)
    }
}

impl From<Padding> for [f64; 4] {
    fn from(padding: Padding) -> Self {
        [padding.top, padding.right, padding.bottom, padding.left]
    }
}
