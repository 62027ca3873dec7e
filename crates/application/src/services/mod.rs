//! Application services - query objects and session state

mod directions;
mod geocoder;
mod request_registry;
mod search;
mod session;

pub use directions::{Directions, DirectionsOptions};
pub use geocoder::{Geocoder, GeocoderLookupOptions, GeocoderOptions, GeocoderReverseLookupOptions};
pub use request_registry::{Callback, DEFAULT_HISTORY_LIMIT, RequestRegistry};
pub use search::{
    AutocompleteDelegate, AutocompleteResultHandler, Search, SearchDelegate, SearchLookupOptions,
    SearchOptions, SearchResultHandler,
};
pub use session::{MAX_REFRESH_LEEWAY_SECS, MapKitSession, SessionOptions};
