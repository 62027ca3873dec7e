//! Overlay entity - Vector shapes drawn on top of the map

use serde::{Deserialize, Serialize};

use crate::projection::{self, EARTH_RADIUS_METERS};
use crate::value_objects::{
    BoundingRegion, Coordinate, FillRule, MapPoint, OpaqueValue, OverlayId, Style,
};

/// Geometry of an overlay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OverlayGeometry {
    /// Circle around a center with a radius in meters
    Circle {
        center: Coordinate,
        radius_meters: f64,
    },
    /// Open line through the points
    Polyline { points: Vec<Coordinate> },
    /// Closed shape; the first ring is the outline, further rings are holes
    Polygon { rings: Vec<Vec<Coordinate>> },
}

impl OverlayGeometry {
    /// Short name of the geometry kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Circle { .. } => "circle",
            Self::Polyline { .. } => "polyline",
            Self::Polygon { .. } => "polygon",
        }
    }
}

/// A styled shape drawn on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overlay {
    /// Unique identifier
    pub id: OverlayId,
    /// Shape
    pub geometry: OverlayGeometry,
    /// Rendering parameters
    #[serde(default)]
    pub style: Style,
    /// Application payload
    #[serde(default)]
    pub data: OpaqueValue,
    /// Whether the overlay is drawn
    pub visible: bool,
    /// Whether the overlay responds to interaction
    pub enabled: bool,
    /// Whether the overlay is selected; maintained by the map
    pub selected: bool,
}

impl Overlay {
    /// Create an overlay with the default style
    #[must_use]
    pub fn new(geometry: OverlayGeometry) -> Self {
        Self {
            id: OverlayId::new(),
            geometry,
            style: Style::default(),
            data: OpaqueValue::Null,
            visible: true,
            enabled: true,
            selected: false,
        }
    }

    /// Create a circle overlay; negative radii are treated as zero
    #[must_use]
    pub fn circle(center: Coordinate, radius_meters: f64) -> Self {
        Self::new(OverlayGeometry::Circle {
            center,
            radius_meters: radius_meters.max(0.0),
        })
    }

    /// Create a polyline overlay
    #[must_use]
    pub fn polyline(points: Vec<Coordinate>) -> Self {
        Self::new(OverlayGeometry::Polyline { points })
    }

    /// Create a polygon overlay without holes
    #[must_use]
    pub fn polygon(outline: Vec<Coordinate>) -> Self {
        Self::new(OverlayGeometry::Polygon {
            rings: vec![outline],
        })
    }

    /// Create a polygon overlay with holes
    #[must_use]
    pub fn polygon_with_holes(outline: Vec<Coordinate>, holes: Vec<Vec<Coordinate>>) -> Self {
        let mut rings = Vec::with_capacity(holes.len() + 1);
        rings.push(outline);
        rings.extend(holes);
        Self::new(OverlayGeometry::Polygon { rings })
    }

    /// Set the style
    #[must_use]
    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Attach an application payload
    #[must_use]
    pub fn with_data(mut self, data: OpaqueValue) -> Self {
        self.data = data;
        self
    }

    /// Smallest bounding region enclosing the geometry
    ///
    /// Returns `None` for lines and polygons without points.
    #[must_use]
    pub fn bounding_region(&self) -> Option<BoundingRegion> {
        match &self.geometry {
            OverlayGeometry::Circle {
                center,
                radius_meters,
            } => {
                let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
                let cos_lat = center.latitude().to_radians().cos().max(f64::EPSILON);
                let lon_delta = (lat_delta / cos_lat).min(180.0);
                Some(BoundingRegion::new(
                    (center.latitude() + lat_delta).min(90.0),
                    projection::wrap_longitude(center.longitude() + lon_delta),
                    (center.latitude() - lat_delta).max(-90.0),
                    projection::wrap_longitude(center.longitude() - lon_delta),
                ))
            },
            OverlayGeometry::Polyline { points } => BoundingRegion::enclosing(points),
            OverlayGeometry::Polygon { rings } => {
                BoundingRegion::enclosing(rings.first().into_iter().flatten())
            },
        }
    }

    /// Whether a coordinate hits the overlay
    ///
    /// Lines are hit within `tolerance_meters` of any segment. Circles and
    /// polygons are hit inside their area, honoring the style's fill rule,
    /// or within the tolerance of their outline.
    #[must_use]
    pub fn hit_test(&self, coordinate: &Coordinate, tolerance_meters: f64) -> bool {
        if !self.visible || !self.enabled {
            return false;
        }
        let tolerance = tolerance_meters.max(0.0);
        match &self.geometry {
            OverlayGeometry::Circle {
                center,
                radius_meters,
            } => center.distance_meters(coordinate) <= radius_meters + tolerance,
            OverlayGeometry::Polyline { points } => {
                distance_to_path_meters(coordinate, points, false) <= tolerance
            },
            OverlayGeometry::Polygon { rings } => {
                let point = coordinate.to_unwrapped_map_point();
                let projected: Vec<Vec<MapPoint>> = rings
                    .iter()
                    .map(|ring| ring.iter().map(Coordinate::to_unwrapped_map_point).collect())
                    .collect();
                let inside = match self.style.fill_rule {
                    FillRule::EvenOdd => crossing_count(&point, &projected) % 2 == 1,
                    FillRule::NonZero => winding_number(&point, &projected) != 0,
                };
                inside
                    || rings
                        .iter()
                        .any(|ring| distance_to_path_meters(coordinate, ring, true) <= tolerance)
            },
        }
    }
}

/// Shortest distance from a coordinate to a path, in meters
fn distance_to_path_meters(coordinate: &Coordinate, path: &[Coordinate], closed: bool) -> f64 {
    let target = coordinate.to_unwrapped_map_point();
    let points: Vec<MapPoint> = path.iter().map(Coordinate::to_unwrapped_map_point).collect();

    let min_units = match points.as_slice() {
        [] => return f64::INFINITY,
        [only] => distance(&target, only),
        _ => {
            let closing = closed.then(|| (points[points.len() - 1], points[0]));
            points
                .windows(2)
                .map(|pair| (pair[0], pair[1]))
                .chain(closing)
                .map(|(a, b)| distance_to_segment(&target, &a, &b))
                .fold(f64::INFINITY, f64::min)
        },
    };
    min_units * projection::meters_per_map_unit(coordinate.latitude())
}

fn distance(a: &MapPoint, b: &MapPoint) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

fn distance_to_segment(p: &MapPoint, a: &MapPoint, b: &MapPoint) -> f64 {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let length_sq = dx.mul_add(dx, dy * dy);
    if length_sq <= f64::EPSILON {
        return distance(p, a);
    }
    let t = ((p.x - a.x).mul_add(dx, (p.y - a.y) * dy) / length_sq).clamp(0.0, 1.0);
    distance(p, &MapPoint::new(t.mul_add(dx, a.x), t.mul_add(dy, a.y)))
}

/// Signed area test: positive when `p` lies left of the directed edge `a -> b`
fn is_left(a: &MapPoint, b: &MapPoint, p: &MapPoint) -> f64 {
    (b.x - a.x).mul_add(p.y - a.y, -((p.x - a.x) * (b.y - a.y)))
}

fn ring_edges(ring: &[MapPoint]) -> impl Iterator<Item = (&MapPoint, &MapPoint)> {
    ring.iter().zip(ring.iter().cycle().skip(1)).take(ring.len())
}

fn crossing_count(point: &MapPoint, rings: &[Vec<MapPoint>]) -> usize {
    rings
        .iter()
        .flat_map(|ring| ring_edges(ring))
        .filter(|(a, b)| {
            (a.y > point.y) != (b.y > point.y)
                && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        })
        .count()
}

fn winding_number(point: &MapPoint, rings: &[Vec<MapPoint>]) -> i32 {
    rings
        .iter()
        .flat_map(|ring| ring_edges(ring))
        .map(|(a, b)| {
            if a.y <= point.y {
                i32::from(b.y > point.y && is_left(a, b, point) > 0.0)
            } else if b.y <= point.y && is_left(a, b, point) < 0.0 {
                -1
            } else {
                0
            }
        })
        .sum()
}
