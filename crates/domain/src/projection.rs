//! Web Mercator projection onto the unit square
//!
//! Map points live in `[0, 1] x [0, 1]`: `x` grows eastward from the
//! antimeridian, `y` grows southward from the northern projection limit.
//! Latitudes beyond [`MAX_LATITUDE`] are clamped before projecting.

use std::f64::consts::PI;

/// Northern and southern limit of the Web Mercator projection in degrees
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// WGS84 equatorial radius in meters
pub const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Project a longitude onto the x axis without wrapping
#[must_use]
pub fn longitude_to_x(longitude: f64) -> f64 {
    (longitude + 180.0) / 360.0
}

/// Project a latitude onto the y axis
#[must_use]
pub fn latitude_to_y(latitude: f64) -> f64 {
    let lat_rad = latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
    0.5 - lat_rad.tan().asinh() / (2.0 * PI)
}

/// Inverse of [`longitude_to_x`]
#[must_use]
pub fn x_to_longitude(x: f64) -> f64 {
    x.mul_add(360.0, -180.0)
}

/// Inverse of [`latitude_to_y`]
#[must_use]
pub fn y_to_latitude(y: f64) -> f64 {
    (PI * 2.0f64.mul_add(-y, 1.0)).sinh().atan().to_degrees()
}

/// Wrap a longitude into [-180, 180]
///
/// Values already inside the range are returned untouched, so 180 stays 180.
#[must_use]
pub fn wrap_longitude(longitude: f64) -> f64 {
    if (-180.0..=180.0).contains(&longitude) {
        return longitude;
    }
    (longitude + 180.0).rem_euclid(360.0) - 180.0
}

/// Wrap an x coordinate into [0, 1)
#[must_use]
pub fn wrap_x(x: f64) -> f64 {
    x.rem_euclid(1.0)
}

/// Length of one map unit along the x axis at the given latitude, in meters
#[must_use]
pub fn meters_per_map_unit(latitude: f64) -> f64 {
    2.0 * PI * EARTH_RADIUS_METERS * latitude.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians().cos()
}
