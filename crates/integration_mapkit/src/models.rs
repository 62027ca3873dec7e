//! Wire types of the maps server API and their conversion into domain records
//!
//! Every field the service may omit is optional or defaulted so that a sparse
//! payload still parses.

use domain::entities::{
    DirectionsRequest, DirectionsResponse, GeocoderResponse, Place, Route, RouteStep,
    SearchAutocompleteResponse, SearchAutocompleteResult, SearchResponse,
};
use domain::value_objects::{BoundingRegion, Coordinate, TransportType};
use serde::Deserialize;
use tracing::warn;

use crate::error::MapKitError;

/// `/v1/token` response
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawTokenResponse {
    pub access_token: String,
    pub expires_in_seconds: u64,
}

/// Edge-described display region
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawMapRegion {
    pub north_latitude: f64,
    pub east_longitude: f64,
    pub south_latitude: f64,
    pub west_longitude: f64,
}

impl From<RawMapRegion> for BoundingRegion {
    fn from(raw: RawMapRegion) -> Self {
        Self::new(
            raw.north_latitude,
            raw.east_longitude,
            raw.south_latitude,
            raw.west_longitude,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawStructuredAddress {
    pub administrative_area: Option<String>,
    pub administrative_area_code: Option<String>,
    pub locality: Option<String>,
    pub sub_locality: Option<String>,
    pub thoroughfare: Option<String>,
    pub sub_thoroughfare: Option<String>,
    pub full_thoroughfare: Option<String>,
    pub post_code: Option<String>,
    pub dependent_localities: Vec<String>,
    pub areas_of_interest: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawPlace {
    #[serde(default)]
    pub name: Option<String>,
    pub coordinate: Coordinate,
    #[serde(default)]
    pub display_map_region: Option<RawMapRegion>,
    #[serde(default)]
    pub formatted_address_lines: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub country_code: Option<String>,
    #[serde(default)]
    pub poi_category: Option<String>,
    #[serde(default)]
    pub structured_address: Option<RawStructuredAddress>,
}

impl From<RawPlace> for Place {
    fn from(raw: RawPlace) -> Self {
        let formatted_address = raw.formatted_address_lines.join(", ");
        let name = raw
            .name
            .or_else(|| raw.formatted_address_lines.first().cloned())
            .unwrap_or_default();
        let address = raw.structured_address.unwrap_or_default();

        Self {
            name,
            coordinate: raw.coordinate,
            formatted_address,
            region: raw
                .display_map_region
                .map(|r| BoundingRegion::from(r).to_coordinate_region()),
            country: raw.country,
            country_code: raw.country_code,
            administrative_area: address.administrative_area,
            administrative_area_code: address.administrative_area_code,
            locality: address.locality,
            sub_locality: address.sub_locality,
            thoroughfare: address.thoroughfare,
            sub_thoroughfare: address.sub_thoroughfare,
            full_thoroughfare: address.full_thoroughfare,
            post_code: address.post_code,
            areas_of_interest: address.areas_of_interest,
            dependent_localities: address.dependent_localities,
            point_of_interest_category: raw.poi_category,
        }
    }
}

/// `/v1/geocode` and `/v1/reverseGeocode` response
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawPlaceResults {
    pub results: Vec<RawPlace>,
}

impl From<RawPlaceResults> for GeocoderResponse {
    fn from(raw: RawPlaceResults) -> Self {
        Self::new(raw.results.into_iter().map(Place::from).collect())
    }
}

/// `/v1/search` response
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawSearchResponse {
    pub display_map_region: Option<RawMapRegion>,
    pub results: Vec<RawPlace>,
}

impl RawSearchResponse {
    pub fn into_domain(self, query: &str) -> SearchResponse {
        SearchResponse::new(
            query,
            self.results.into_iter().map(Place::from).collect(),
            self.display_map_region.map(BoundingRegion::from),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawAutocompleteResult {
    pub completion_url: Option<String>,
    pub display_lines: Vec<String>,
    pub location: Option<Coordinate>,
}

/// `/v1/searchAutocomplete` response
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RawAutocompleteResponse {
    pub results: Vec<RawAutocompleteResult>,
}

impl RawAutocompleteResponse {
    pub fn into_domain(self, query: &str) -> SearchAutocompleteResponse {
        let results = self
            .results
            .into_iter()
            .map(|r| SearchAutocompleteResult {
                display_lines: r.display_lines,
                coordinate: r.location,
                completion_url: r.completion_url,
            })
            .collect();
        SearchAutocompleteResponse::new(query, results)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawRoute {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub transport_type: Option<String>,
    #[serde(default)]
    pub step_indexes: Vec<usize>,
    #[serde(default)]
    pub has_tolls: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RawStep {
    pub step_path_index: usize,
    #[serde(default)]
    pub distance_meters: f64,
    #[serde(default)]
    pub duration_seconds: f64,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub transport_type: Option<String>,
}

/// `/v1/directions` response
///
/// Routes reference steps by index, and steps reference their path by index.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(crate) struct RawDirectionsResponse {
    pub routes: Vec<RawRoute>,
    pub steps: Vec<RawStep>,
    pub step_paths: Vec<Vec<Coordinate>>,
}

impl RawDirectionsResponse {
    /// Resolve the index tables into self-contained routes
    ///
    /// # Errors
    ///
    /// Returns `ParseError` if a route or step points outside its table.
    pub fn into_domain(self, request: DirectionsRequest) -> Result<DirectionsResponse, MapKitError> {
        let fallback = request.transport_type;
        let mut routes = Vec::with_capacity(self.routes.len());

        for (index, raw) in self.routes.into_iter().enumerate() {
            let transport_type = parse_transport_type(raw.transport_type.as_deref(), fallback);
            let steps = raw
                .step_indexes
                .iter()
                .map(|&i| {
                    let step = self.steps.get(i).ok_or_else(|| {
                        MapKitError::ParseError(format!("route {index} references missing step {i}"))
                    })?;
                    let path = self.step_paths.get(step.step_path_index).ok_or_else(|| {
                        MapKitError::ParseError(format!(
                            "step {i} references missing path {}",
                            step.step_path_index
                        ))
                    })?;
                    Ok(RouteStep {
                        path: path.clone(),
                        instructions: step.instructions.clone().unwrap_or_default(),
                        distance_meters: step.distance_meters,
                        expected_travel_time_secs: step.duration_seconds,
                        transport_type: parse_transport_type(
                            step.transport_type.as_deref(),
                            transport_type,
                        ),
                    })
                })
                .collect::<Result<Vec<_>, MapKitError>>()?;

            routes.push(Route::from_steps(
                raw.name.unwrap_or_default(),
                raw.distance_meters,
                raw.duration_seconds,
                transport_type,
                raw.has_tolls,
                steps,
            ));
        }

        Ok(DirectionsResponse::new(request, routes))
    }
}

fn parse_transport_type(raw: Option<&str>, fallback: TransportType) -> TransportType {
    raw.map_or(fallback, |value| {
        value.parse().unwrap_or_else(|_| {
            warn!(%value, "Unknown transport type, using request default");
            fallback
        })
    })
}
