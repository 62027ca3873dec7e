//! Edge-described geographic bounding box

use serde::{Deserialize, Serialize};

use crate::projection;
use crate::value_objects::{Coordinate, CoordinateRegion, CoordinateSpan};

/// An axis-aligned latitude/longitude box given by its four edges
///
/// When `east_longitude < west_longitude` the box crosses the antimeridian.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRegion {
    /// Northern edge latitude
    pub north_latitude: f64,
    /// Eastern edge longitude
    pub east_longitude: f64,
    /// Southern edge latitude
    pub south_latitude: f64,
    /// Western edge longitude
    pub west_longitude: f64,
}

impl BoundingRegion {
    /// Create a new bounding region
    #[must_use]
    pub const fn new(
        north_latitude: f64,
        east_longitude: f64,
        south_latitude: f64,
        west_longitude: f64,
    ) -> Self {
        Self {
            north_latitude,
            east_longitude,
            south_latitude,
            west_longitude,
        }
    }

    /// Smallest region covering all coordinates, or `None` for an empty input
    ///
    /// Longitudes are taken as given, so the result never crosses the
    /// antimeridian.
    #[must_use]
    pub fn enclosing<'a, I>(coordinates: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        coordinates.into_iter().fold(None, |acc, c| {
            let (lat, lon) = (c.latitude(), c.longitude());
            Some(match acc {
                None => Self::new(lat, lon, lat, lon),
                Some(b) => Self::new(
                    b.north_latitude.max(lat),
                    b.east_longitude.max(lon),
                    b.south_latitude.min(lat),
                    b.west_longitude.min(lon),
                ),
            })
        })
    }

    /// Whether the box wraps across the 180th meridian
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.east_longitude < self.west_longitude
    }

    /// Longitude extent in degrees, accounting for antimeridian crossing
    #[must_use]
    pub fn longitude_delta(&self) -> f64 {
        if self.crosses_antimeridian() {
            self.east_longitude + 360.0 - self.west_longitude
        } else {
            self.east_longitude - self.west_longitude
        }
    }

    /// Convert to center and span form
    #[must_use]
    pub fn to_coordinate_region(&self) -> CoordinateRegion {
        let longitude_delta = self.longitude_delta();
        let center = Coordinate::new(
            f64::midpoint(self.north_latitude, self.south_latitude),
            projection::wrap_longitude(self.west_longitude + longitude_delta / 2.0),
        );
        CoordinateRegion::new(
            center,
            CoordinateSpan::new(self.north_latitude - self.south_latitude, longitude_delta),
        )
    }

    /// Whether the coordinate lies within the box, borders included
    #[must_use]
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        let lat = coordinate.latitude();
        if !(self.south_latitude..=self.north_latitude).contains(&lat) {
            return false;
        }
        let lon = projection::wrap_longitude(coordinate.longitude());
        if self.crosses_antimeridian() {
            lon >= self.west_longitude || lon <= self.east_longitude
        } else {
            (self.west_longitude..=self.east_longitude).contains(&lon)
        }
    }
}
