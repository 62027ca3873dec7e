//! Maps server API integration for mapframe
//!
//! Provides geocoding, reverse geocoding, place search, search autocomplete
//! and directions through the vendor's HTTP server API.
//!
//! # Architecture
//!
//! [`MapKitClient`] defines the interface, implemented over HTTP by
//! [`HttpMapKitClient`]. The client exchanges the host's authorization token
//! for an access token, caches it, and converts the raw wire payloads into
//! domain records. Geocode responses are cached with a configurable TTL.
//!
//! # Example
//!
//! ```rust,ignore
//! use integration_mapkit::{GeocodeParams, HttpMapKitClient, MapKitClient, MapKitConfig};
//!
//! let client = HttpMapKitClient::new(&MapKitConfig::default())?;
//! let response = client
//!     .geocode(&auth_token, &GeocodeParams { query: "1 Apple Park Way".into(), ..Default::default() })
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod models;

pub use client::{GeocodeParams, HttpMapKitClient, MapKitClient, SearchParams};
pub use config::MapKitConfig;
pub use error::MapKitError;
