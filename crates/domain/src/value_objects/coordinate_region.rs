//! Geographic viewport regions

use serde::{Deserialize, Serialize};

use crate::projection;
use crate::value_objects::{BoundingRegion, Coordinate, MapRect};

/// Latitude and longitude extent of a region in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoordinateSpan {
    /// North-to-south extent
    pub latitude_delta: f64,
    /// West-to-east extent
    pub longitude_delta: f64,
}

impl CoordinateSpan {
    /// Create a new span
    #[must_use]
    pub const fn new(latitude_delta: f64, longitude_delta: f64) -> Self {
        Self {
            latitude_delta,
            longitude_delta,
        }
    }

    /// Compare with a tolerance in degrees
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        (self.latitude_delta - other.latitude_delta).abs() <= epsilon
            && (self.longitude_delta - other.longitude_delta).abs() <= epsilon
    }
}

/// A rectangular geographic region described by its center and span
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CoordinateRegion {
    /// Center of the region
    pub center: Coordinate,
    /// Extent of the region
    pub span: CoordinateSpan,
}

impl CoordinateRegion {
    /// Create a new region
    #[must_use]
    pub const fn new(center: Coordinate, span: CoordinateSpan) -> Self {
        Self { center, span }
    }

    /// Latitude of the northern edge
    #[must_use]
    pub fn north(&self) -> f64 {
        self.center.latitude() + self.span.latitude_delta / 2.0
    }

    /// Latitude of the southern edge
    #[must_use]
    pub fn south(&self) -> f64 {
        self.center.latitude() - self.span.latitude_delta / 2.0
    }

    /// Unwrapped longitude of the eastern edge
    #[must_use]
    pub fn east(&self) -> f64 {
        self.center.longitude() + self.span.longitude_delta / 2.0
    }

    /// Unwrapped longitude of the western edge
    #[must_use]
    pub fn west(&self) -> f64 {
        self.center.longitude() - self.span.longitude_delta / 2.0
    }

    /// Convert to edge form, wrapping longitudes into [-180, 180]
    ///
    /// A region covering the whole globe horizontally maps to -180..180.
    #[must_use]
    pub fn to_bounding_region(&self) -> BoundingRegion {
        let (east, west) = if self.span.longitude_delta >= 360.0 {
            (180.0, -180.0)
        } else {
            (
                projection::wrap_longitude(self.east()),
                projection::wrap_longitude(self.west()),
            )
        };
        BoundingRegion::new(self.north(), east, self.south(), west)
    }

    /// Convert to the projected rectangle spanning the same edges
    #[must_use]
    pub fn to_map_rect(&self) -> MapRect {
        let north_west = Coordinate::new(self.north(), self.west()).to_unwrapped_map_point();
        let south_east = Coordinate::new(self.south(), self.east()).to_unwrapped_map_point();
        MapRect::new(
            north_west.x,
            north_west.y,
            south_east.x - north_west.x,
            south_east.y - north_west.y,
        )
    }

    /// Whether the coordinate lies within the region
    #[must_use]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        self.to_bounding_region().contains(coordinate)
    }

    /// Compare with a tolerance in degrees
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        self.center.approx_eq(&other.center, epsilon) && self.span.approx_eq(&other.span, epsilon)
    }
}
