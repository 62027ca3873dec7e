//! Domain entities - Objects with identity and lifecycle

mod annotation;
mod directions;
mod map;
mod overlay;
mod place;
mod search;
mod tile_overlay;

pub use annotation::{
    Annotation, AnnotationKind, Callout, CalloutDelegate, CollisionMode, DEFAULT_GLYPH_COLOR,
    DEFAULT_MARKER_COLOR, DisplayPriority, ImageSource, MarkerStyle,
};
pub use directions::{
    DirectionsRequest, DirectionsResponse, Route, RouteEndpoint, RouteStep,
};
pub use map::{
    ColorScheme, ListenerId, Map, MapEvent, MapEventKind, MapItemRef, MapOptions, MapType,
};
pub use overlay::{Overlay, OverlayGeometry};
pub use place::{GeocoderResponse, Place};
pub use search::{SearchAutocompleteResponse, SearchAutocompleteResult, SearchResponse};
pub use tile_overlay::{MAX_ZOOM_LEVEL, MIN_ZOOM_LEVEL, TileOverlay};
