//! Projected map-plane rectangle

use serde::{Deserialize, Serialize};

use crate::value_objects::{Coordinate, CoordinateRegion, CoordinateSpan, MapPoint, MapSize};

/// An axis-aligned rectangle on the projected map plane
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapRect {
    /// North-west corner
    pub origin: MapPoint,
    /// Extent of the rectangle
    pub size: MapSize,
}

impl MapRect {
    /// Create a rectangle from its origin and size components
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: MapPoint::new(x, y),
            size: MapSize::new(width, height),
        }
    }

    /// Smallest rectangle covering both points
    #[must_use]
    pub fn from_points(a: MapPoint, b: MapPoint) -> Self {
        let min_x = a.x.min(b.x);
        let min_y = a.y.min(b.y);
        Self::new(min_x, min_y, a.x.max(b.x) - min_x, a.y.max(b.y) - min_y)
    }

    /// Western edge
    #[must_use]
    pub const fn min_x(&self) -> f64 {
        self.origin.x
    }

    /// Horizontal center
    #[must_use]
    pub fn mid_x(&self) -> f64 {
        self.origin.x + self.size.width / 2.0
    }

    /// Eastern edge
    #[must_use]
    pub fn max_x(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Northern edge
    #[must_use]
    pub const fn min_y(&self) -> f64 {
        self.origin.y
    }

    /// Vertical center
    #[must_use]
    pub fn mid_y(&self) -> f64 {
        self.origin.y + self.size.height / 2.0
    }

    /// Southern edge
    #[must_use]
    pub fn max_y(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Center point
    #[must_use]
    pub fn center(&self) -> MapPoint {
        MapPoint::new(self.mid_x(), self.mid_y())
    }

    /// Scale the rectangle around `center` (its own center when `None`)
    #[must_use]
    pub fn scale(&self, factor: f64, center: Option<MapPoint>) -> Self {
        let center = center.unwrap_or_else(|| self.center());
        Self::new(
            (self.origin.x - center.x).mul_add(factor, center.x),
            (self.origin.y - center.y).mul_add(factor, center.y),
            self.size.width * factor,
            self.size.height * factor,
        )
    }

    /// Smallest rectangle containing both rectangles
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let min_x = self.min_x().min(other.min_x());
        let min_y = self.min_y().min(other.min_y());
        let max_x = self.max_x().max(other.max_x());
        let max_y = self.max_y().max(other.max_y());
        Self::new(min_x, min_y, max_x - min_x, max_y - min_y)
    }

    /// Whether the point lies inside or on the border
    #[must_use]
    pub fn contains_point(&self, point: &MapPoint) -> bool {
        (self.min_x()..=self.max_x()).contains(&point.x)
            && (self.min_y()..=self.max_y()).contains(&point.y)
    }

    /// Convert to a geographic region spanning the same edges
    ///
    /// The region's center latitude is the midpoint of the edge latitudes,
    /// not the projection of [`MapRect::mid_y`]; this keeps the conversion
    /// an exact inverse of [`CoordinateRegion::to_map_rect`].
    #[must_use]
    pub fn to_coordinate_region(&self) -> CoordinateRegion {
        let north_west = MapPoint::new(self.min_x(), self.min_y()).to_coordinate();
        let south_east = MapPoint::new(self.max_x(), self.max_y()).to_coordinate();

        let north = north_west.latitude();
        let south = south_east.latitude();
        let west = north_west.longitude();
        let east = south_east.longitude();

        CoordinateRegion::new(
            Coordinate::new(f64::midpoint(north, south), f64::midpoint(west, east)),
            CoordinateSpan::new(north - south, east - west),
        )
    }

    /// Compare with an absolute tolerance in map units
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.origin.approx_eq(&other.origin, epsilon) && self.size.approx_eq(&other.size, epsilon)
    }
}
