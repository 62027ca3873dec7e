//! Value Objects - Immutable, identity-less domain primitives

mod bounding_region;
mod coordinate;
mod coordinate_region;
mod feature_visibility;
mod map_item_id;
mod map_point;
mod map_rect;
mod padding;
mod request;
mod screen;
mod style;
mod transport_type;

pub use bounding_region::BoundingRegion;
pub use coordinate::Coordinate;
pub use coordinate_region::{CoordinateRegion, CoordinateSpan};
pub use feature_visibility::FeatureVisibility;
pub use map_item_id::{AnnotationId, OverlayId};
pub use map_point::{MapPoint, MapSize};
pub use map_rect::MapRect;
pub use padding::Padding;
pub use request::{RequestHandle, RequestState};
pub use screen::{ScreenPoint, ViewportSize};
pub use style::{DEFAULT_STYLE_COLOR, FillRule, LineCap, LineJoin, Style};
pub use transport_type::TransportType;

/// Opaque passthrough payload attached by the application
///
/// The engine never inspects these values.
pub type OpaqueValue = serde_json::Value;
