//! Projected map-plane point and size

use serde::{Deserialize, Serialize};

use crate::projection;
use crate::value_objects::Coordinate;

/// A point on the projected map plane
///
/// The world spans the unit square; `x` grows eastward, `y` southward.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapPoint {
    /// Horizontal position
    pub x: f64,
    /// Vertical position
    pub y: f64,
}

impl MapPoint {
    /// Create a new map point
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Convert back to geographic space
    ///
    /// `x` is not wrapped, so points east of the unit square yield
    /// longitudes greater than 180.
    #[must_use]
    pub fn to_coordinate(&self) -> Coordinate {
        Coordinate::new(
            projection::y_to_latitude(self.y),
            projection::x_to_longitude(self.x),
        )
    }

    /// Compare with an absolute tolerance in map units
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.x - other.x).abs() <= epsilon && (self.y - other.y).abs() <= epsilon
    }
}

/// A size on the projected map plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapSize {
    /// Extent along the x axis
    pub width: f64,
    /// Extent along the y axis
    pub height: f64,
}

impl MapSize {
    /// Create a new map size
    #[must_use]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Compare with an absolute tolerance in map units
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.width - other.width).abs() <= epsilon
            && (self.height - other.height).abs() <= epsilon
    }
}
