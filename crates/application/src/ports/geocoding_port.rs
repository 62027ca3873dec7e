//! Geocoding engine port
//!
//! Defines the interface to the external engine that resolves addresses to
//! places and places to addresses. Adapters in the infrastructure layer
//! implement this port on top of the vendor's server API.

use async_trait::async_trait;
use domain::entities::GeocoderResponse;
use domain::value_objects::{Coordinate, CoordinateRegion};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Forward geocoding query as handed to the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocodeQuery {
    /// Address or place name, already trimmed
    pub text: String,
    /// Preferred result language (BCP 47)
    pub language: Option<String>,
    /// Hint to prefer results near this position
    pub coordinate: Option<Coordinate>,
    /// Hint to prefer results inside this region
    pub region: Option<CoordinateRegion>,
    /// ISO 3166-1 alpha-2 codes results are limited to
    pub limit_to_countries: Vec<String>,
}

/// Reverse geocoding query as handed to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReverseGeocodeQuery {
    /// Position to describe
    pub coordinate: Coordinate,
    /// Preferred result language (BCP 47)
    pub language: Option<String>,
}

/// Port for the geocoding engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait GeocodingEngine: Send + Sync {
    /// Resolve an address or place name to matching places
    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocoderResponse, ApplicationError>;

    /// Describe the places at a position
    async fn reverse_geocode(
        &self,
        query: &ReverseGeocodeQuery,
    ) -> Result<GeocoderResponse, ApplicationError>;
}
