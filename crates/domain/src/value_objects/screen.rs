//! Screen-space primitives

use serde::{Deserialize, Serialize};

/// A point or offset in screen pixels, relative to the top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScreenPoint {
    /// Horizontal pixels, growing rightwards
    pub x: f64,
    /// Vertical pixels, growing downwards
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel dimensions of the map view
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    /// Width in pixels
    pub width: f64,
    /// Height in pixels
    pub height: f64,
}

impl ViewportSize {
    /// Create a new viewport size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Center of the viewport
    #[must_use]
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether both dimensions are positive
    #[must_use]
    pub fn is_drawable(&self) -> bool {
        self.width > 0.0 && self.height > 0.0
    }
}

impl Default for ViewportSize {
    fn default() -> Self {
        Self::new(1024.0, 768.0)
    }
}
