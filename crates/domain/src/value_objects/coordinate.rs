//! Geographic coordinate value object

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::DomainError;
use crate::projection::{self, EARTH_RADIUS_METERS};
use crate::value_objects::MapPoint;

/// A geographic location with latitude and longitude in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees (-90 to 90)
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    longitude: f64,
}

impl Coordinate {
    /// Create a coordinate without validation
    ///
    /// Out-of-range values are accepted as-is; projection clamps latitude
    /// and wraps longitude when converting to map points.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Create a coordinate, rejecting values outside the geographic range
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidCoordinate` if latitude is not in [-90, 90]
    /// or longitude is not in [-180, 180].
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, DomainError> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(DomainError::InvalidCoordinate(format!(
                "latitude {latitude} must be between -90 and 90"
            )));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(DomainError::InvalidCoordinate(format!(
                "longitude {longitude} must be between -180 and 180"
            )));
        }
        Ok(Self::new(latitude, longitude))
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Project onto the unit square, wrapping longitude so that `x` lies in [0, 1)
    #[must_use]
    pub fn to_map_point(&self) -> MapPoint {
        let unwrapped = self.to_unwrapped_map_point();
        MapPoint::new(projection::wrap_x(unwrapped.x), unwrapped.y)
    }

    /// Project onto the map plane without wrapping longitude
    ///
    /// Longitudes beyond 180 produce `x > 1`, which keeps shapes that cross
    /// the antimeridian contiguous.
    #[must_use]
    pub fn to_unwrapped_map_point(&self) -> MapPoint {
        MapPoint::new(
            projection::longitude_to_x(self.longitude),
            projection::latitude_to_y(self.latitude),
        )
    }

    /// Compare with a tolerance in degrees, treating longitudes modulo 360
    #[must_use]
    pub fn approx_eq(&self, other: &Self, epsilon: f64) -> bool {
        let lon_delta = projection::wrap_longitude(self.longitude - other.longitude);
        (self.latitude - other.latitude).abs() <= epsilon && lon_delta.abs() <= epsilon
    }

    /// Great-circle distance to another coordinate in meters
    ///
    /// Uses the Haversine formula.
    #[must_use]
    pub fn distance_meters(&self, other: &Self) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (lat1_rad.cos() * lat2_rad.cos()).mul_add(
            (delta_lon / 2.0).sin().powi(2),
            (delta_lat / 2.0).sin().powi(2),
        );
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_METERS * c
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((latitude, longitude): (f64, f64)) -> Self {
        Self::new(latitude, longitude)
    }
}
