//! Place entity - Geocoding and search result records

use serde::{Deserialize, Serialize};

use crate::value_objects::{BoundingRegion, Coordinate, CoordinateRegion};

/// A location returned by a geocoding or search request
///
/// Places are immutable snapshots owned by the response that produced them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Place {
    /// Display name
    pub name: String,
    /// Position of the place
    pub coordinate: Coordinate,
    /// Single-line address
    pub formatted_address: String,
    /// Suggested region for displaying the place
    pub region: Option<CoordinateRegion>,
    /// Country name
    pub country: Option<String>,
    /// ISO 3166-1 alpha-2 country code
    pub country_code: Option<String>,
    /// State or province
    pub administrative_area: Option<String>,
    /// Abbreviation of the state or province
    pub administrative_area_code: Option<String>,
    /// City
    pub locality: Option<String>,
    /// Neighborhood or district
    pub sub_locality: Option<String>,
    /// Street name
    pub thoroughfare: Option<String>,
    /// House number
    pub sub_thoroughfare: Option<String>,
    /// Street name and house number
    pub full_thoroughfare: Option<String>,
    /// Postal code
    pub post_code: Option<String>,
    /// Landmarks associated with the place
    pub areas_of_interest: Vec<String>,
    /// Neighborhoods associated with the place
    pub dependent_localities: Vec<String>,
    /// Point-of-interest category, e.g. `Restaurant`
    pub point_of_interest_category: Option<String>,
}

impl Place {
    /// Create a place with a name and position
    #[must_use]
    pub fn new(name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            name: name.into(),
            coordinate,
            ..Self::default()
        }
    }

    /// Set the single-line address
    #[must_use]
    pub fn with_formatted_address(mut self, address: impl Into<String>) -> Self {
        self.formatted_address = address.into();
        self
    }

    /// Set the display region
    #[must_use]
    pub const fn with_region(mut self, region: CoordinateRegion) -> Self {
        self.region = Some(region);
        self
    }

    /// Set country and country code
    #[must_use]
    pub fn with_country(mut self, country: impl Into<String>, code: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self.country_code = Some(code.into());
        self
    }

    /// Set the locality
    #[must_use]
    pub fn with_locality(mut self, locality: impl Into<String>) -> Self {
        self.locality = Some(locality.into());
        self
    }

    /// Display region as edge bounds, if known
    #[must_use]
    pub fn bounding_region(&self) -> Option<BoundingRegion> {
        self.region.as_ref().map(CoordinateRegion::to_bounding_region)
    }

    /// Human readable one-liner, falling back to the coordinate
    #[must_use]
    pub fn summary(&self) -> String {
        match (self.name.is_empty(), self.formatted_address.is_empty()) {
            (false, false) if self.name != self.formatted_address => {
                format!("{} ({})", self.name, self.formatted_address)
            },
            (false, _) => self.name.clone(),
            (true, false) => self.formatted_address.clone(),
            (true, true) => self.coordinate.to_string(),
        }
    }
}

/// Result of a forward or reverse geocoding request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeocoderResponse {
    /// Matching places, best match first
    pub results: Vec<Place>,
}

impl GeocoderResponse {
    /// Create a response from places
    #[must_use]
    pub const fn new(results: Vec<Place>) -> Self {
        Self { results }
    }

    /// Best match, if any
    #[must_use]
    pub fn first(&self) -> Option<&Place> {
        self.results.first()
    }

    /// Whether no place matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
