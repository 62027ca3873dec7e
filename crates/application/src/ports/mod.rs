//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! the external mapping engine. Adapters in the infrastructure layer
//! implement these ports.

mod directions_port;
mod geocoding_port;
mod search_port;
mod token_port;

#[cfg(test)]
pub use directions_port::MockDirectionsEngine;
pub use directions_port::{DirectionsEngine, RouteQuery};
#[cfg(test)]
pub use geocoding_port::MockGeocodingEngine;
pub use geocoding_port::{GeocodeQuery, GeocodingEngine, ReverseGeocodeQuery};
#[cfg(test)]
pub use search_port::MockSearchEngine;
pub use search_port::{SearchEngine, SearchQuery};
#[cfg(test)]
pub use token_port::MockTokenProvider;
pub use token_port::{AuthorizationToken, TokenProvider};
