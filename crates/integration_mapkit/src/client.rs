//! HTTP client for the maps server API
//!
//! Exchanges the host's authorization token for a short-lived access token
//! at `/v1/token`, then calls the geocode, search, autocomplete and
//! directions endpoints with it. Access tokens are cached until shortly
//! before they expire and exchanged again once after a 401.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use domain::entities::{
    DirectionsRequest, DirectionsResponse, GeocoderResponse, RouteEndpoint, SearchAutocompleteResponse,
    SearchResponse,
};
use domain::value_objects::{Coordinate, CoordinateRegion};
use moka::future::Cache;
use reqwest::{Client, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};

use crate::config::MapKitConfig;
use crate::error::MapKitError;
use crate::models::{
    RawAutocompleteResponse, RawDirectionsResponse, RawPlaceResults, RawSearchResponse,
    RawTokenResponse,
};

/// Parameters of a forward geocode call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeocodeParams {
    /// Address or place name
    pub query: String,
    /// Result language (BCP 47)
    pub language: Option<String>,
    /// Bias results toward this position
    pub search_location: Option<Coordinate>,
    /// Bias results toward this region
    pub search_region: Option<CoordinateRegion>,
    /// ISO 3166 country codes to restrict results to
    pub limit_to_countries: Vec<String>,
}

/// Parameters of a search or autocomplete call
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    /// Free-form query
    pub query: String,
    /// Result language (BCP 47)
    pub language: Option<String>,
    /// Bias results toward this position
    pub search_location: Option<Coordinate>,
    /// Bias results toward this region
    pub search_region: Option<CoordinateRegion>,
    /// Include points of interest
    pub include_points_of_interest: bool,
    /// Include addresses
    pub include_addresses: bool,
    /// ISO 3166 country codes to restrict results to
    pub limit_to_countries: Vec<String>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            query: String::new(),
            language: None,
            search_location: None,
            search_region: None,
            include_points_of_interest: true,
            include_addresses: true,
            limit_to_countries: Vec::new(),
        }
    }
}

/// Trait for maps server API clients
///
/// Every call takes the host's authorization token; implementations handle
/// the access-token exchange themselves.
#[async_trait]
pub trait MapKitClient: Send + Sync {
    /// Resolve an address to places
    async fn geocode(
        &self,
        auth_token: &SecretString,
        params: &GeocodeParams,
    ) -> Result<GeocoderResponse, MapKitError>;

    /// Resolve a position to places
    async fn reverse_geocode(
        &self,
        auth_token: &SecretString,
        coordinate: Coordinate,
        language: Option<&str>,
    ) -> Result<GeocoderResponse, MapKitError>;

    /// Search for places and points of interest
    async fn search(
        &self,
        auth_token: &SecretString,
        params: &SearchParams,
    ) -> Result<SearchResponse, MapKitError>;

    /// Suggest completions for a partial query
    async fn search_autocomplete(
        &self,
        auth_token: &SecretString,
        params: &SearchParams,
    ) -> Result<SearchAutocompleteResponse, MapKitError>;

    /// Compute routes
    async fn directions(
        &self,
        auth_token: &SecretString,
        request: &DirectionsRequest,
        language: Option<&str>,
    ) -> Result<DirectionsResponse, MapKitError>;
}

/// Access tokens are exchanged again after a day at the latest
const MAX_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(86_400);

#[derive(Debug)]
struct AccessToken {
    value: SecretString,
    refresh_at: Instant,
}

/// Maps server API client over HTTP
#[derive(Debug)]
pub struct HttpMapKitClient {
    client: Client,
    config: MapKitConfig,
    access_token: Mutex<Option<AccessToken>>,
    geocode_cache: Option<Cache<String, GeocoderResponse>>,
}

impl HttpMapKitClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &MapKitConfig) -> Result<Self, MapKitError> {
        config.validate().map_err(MapKitError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("mapframe/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| MapKitError::ConnectionFailed(e.to_string()))?;

        let geocode_cache = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build()
        });

        Ok(Self {
            client,
            config: config.clone(),
            access_token: Mutex::new(None),
            geocode_cache,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.config.base_url.trim_end_matches('/'))
    }

    fn transport_error(&self, e: &reqwest::Error) -> MapKitError {
        if e.is_timeout() {
            MapKitError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            MapKitError::ConnectionFailed(e.to_string())
        }
    }

    /// Cached access token, exchanging the authorization token when stale
    async fn access_token(&self, auth_token: &SecretString) -> Result<SecretString, MapKitError> {
        let mut cached = self.access_token.lock().await;
        if let Some(token) = cached.as_ref()
            && Instant::now() < token.refresh_at
        {
            return Ok(token.value.clone());
        }

        debug!("Exchanging authorization token");
        let response = self
            .client
            .get(self.url("/v1/token"))
            .bearer_auth(auth_token.expose_secret())
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        let body = read_body(check_status(response).await?).await?;
        let raw: RawTokenResponse =
            serde_json::from_str(&body).map_err(|e| MapKitError::ParseError(e.to_string()))?;

        if raw.access_token.trim().is_empty() {
            return Err(MapKitError::Unauthorized(
                "Token exchange returned an empty access token".to_string(),
            ));
        }

        let margin = Duration::from_secs(self.config.token_refresh_margin_secs);
        let lifetime = Duration::from_secs(raw.expires_in_seconds)
            .min(MAX_ACCESS_TOKEN_LIFETIME)
            .saturating_sub(margin);
        let now = Instant::now();
        let value = SecretString::from(raw.access_token);
        *cached = Some(AccessToken {
            value: value.clone(),
            refresh_at: now.checked_add(lifetime).unwrap_or(now),
        });
        debug!(expires_in_secs = raw.expires_in_seconds, "Access token cached");
        Ok(value)
    }

    async fn clear_access_token(&self) {
        self.access_token.lock().await.take();
    }

    async fn send(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
        access_token: &SecretString,
    ) -> Result<String, MapKitError> {
        let response = self
            .client
            .get(self.url(endpoint))
            .bearer_auth(access_token.expose_secret())
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;
        read_body(check_status(response).await?).await
    }

    /// Call an endpoint, exchanging the token again once if it is rejected
    async fn get<T: DeserializeOwned>(
        &self,
        auth_token: &SecretString,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T, MapKitError> {
        let access_token = self.access_token(auth_token).await?;
        let body = match self.send(endpoint, params, &access_token).await {
            Err(MapKitError::Unauthorized(reason)) => {
                debug!(%endpoint, %reason, "Access token rejected, exchanging again");
                self.clear_access_token().await;
                let access_token = self.access_token(auth_token).await?;
                self.send(endpoint, params, &access_token).await?
            },
            other => other?,
        };
        serde_json::from_str(&body).map_err(|e| MapKitError::ParseError(e.to_string()))
    }
}

fn format_coordinate(coordinate: &Coordinate) -> String {
    format!("{},{}", coordinate.latitude(), coordinate.longitude())
}

fn format_region(region: &CoordinateRegion) -> String {
    let b = region.to_bounding_region();
    format!(
        "{},{},{},{}",
        b.north_latitude, b.east_longitude, b.south_latitude, b.west_longitude
    )
}

fn format_endpoint(endpoint: &RouteEndpoint) -> String {
    match endpoint {
        RouteEndpoint::Text(text) => text.clone(),
        RouteEndpoint::Coordinate(c) => format_coordinate(c),
        RouteEndpoint::Place(place) => format_coordinate(&place.coordinate),
    }
}

fn push_common(
    params: &mut Vec<(&'static str, String)>,
    language: Option<&str>,
    search_location: Option<&Coordinate>,
    search_region: Option<&CoordinateRegion>,
    limit_to_countries: &[String],
) {
    if let Some(lang) = language {
        params.push(("lang", lang.to_string()));
    }
    if let Some(location) = search_location {
        params.push(("searchLocation", format_coordinate(location)));
    }
    if let Some(region) = search_region {
        params.push(("searchRegion", format_region(region)));
    }
    if !limit_to_countries.is_empty() {
        params.push(("limitToCountries", limit_to_countries.join(",")));
    }
}

fn search_query_params(params: &SearchParams) -> Vec<(&'static str, String)> {
    let mut query = vec![("q", params.query.clone())];
    push_common(
        &mut query,
        params.language.as_deref(),
        params.search_location.as_ref(),
        params.search_region.as_ref(),
        &params.limit_to_countries,
    );
    let filter: Vec<&str> = [
        (params.include_points_of_interest, "Poi"),
        (params.include_addresses, "Address"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    if !filter.is_empty() {
        query.push(("resultTypeFilter", filter.join(",")));
    }
    query
}

async fn check_status(response: Response) -> Result<Response, MapKitError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(MapKitError::Unauthorized(format!("HTTP {status}")))
        },
        StatusCode::TOO_MANY_REQUESTS => Err(MapKitError::RateLimitExceeded {
            retry_after_secs: response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        }),
        StatusCode::NOT_FOUND => Err(MapKitError::NotFound(response.url().path().to_string())),
        StatusCode::BAD_REQUEST => {
            let detail = response.text().await.unwrap_or_default();
            Err(MapKitError::BadRequest(if detail.is_empty() {
                format!("HTTP {status}")
            } else {
                detail
            }))
        },
        s if s.is_server_error() => Err(MapKitError::ServiceUnavailable(format!("HTTP {status}"))),
        _ => Err(MapKitError::RequestFailed(format!("HTTP {status}"))),
    }
}

async fn read_body(response: Response) -> Result<String, MapKitError> {
    response
        .text()
        .await
        .map_err(|e| MapKitError::ParseError(e.to_string()))
}

#[async_trait]
impl MapKitClient for HttpMapKitClient {
    #[instrument(skip(self, auth_token), fields(query = %params.query))]
    async fn geocode(
        &self,
        auth_token: &SecretString,
        params: &GeocodeParams,
    ) -> Result<GeocoderResponse, MapKitError> {
        let cache_key = format!(
            "{}|{:?}|{:?}|{:?}|{}",
            params.query.trim().to_lowercase(),
            params.language,
            params.search_location,
            params.search_region,
            params.limit_to_countries.join(",")
        );
        if let Some(cache) = &self.geocode_cache
            && let Some(hit) = cache.get(&cache_key).await
        {
            debug!("Geocode cache hit");
            return Ok(hit);
        }

        let mut query = vec![("q", params.query.clone())];
        push_common(
            &mut query,
            params.language.as_deref(),
            params.search_location.as_ref(),
            params.search_region.as_ref(),
            &params.limit_to_countries,
        );

        let raw: RawPlaceResults = self.get(auth_token, "/v1/geocode", &query).await?;
        let response = GeocoderResponse::from(raw);
        debug!(count = response.results.len(), "Geocode results");

        if let Some(cache) = &self.geocode_cache {
            cache.insert(cache_key, response.clone()).await;
        }
        Ok(response)
    }

    #[instrument(skip(self, auth_token), fields(location = %format_coordinate(&coordinate)))]
    async fn reverse_geocode(
        &self,
        auth_token: &SecretString,
        coordinate: Coordinate,
        language: Option<&str>,
    ) -> Result<GeocoderResponse, MapKitError> {
        let mut query = vec![("loc", format_coordinate(&coordinate))];
        if let Some(lang) = language {
            query.push(("lang", lang.to_string()));
        }

        let raw: RawPlaceResults = self.get(auth_token, "/v1/reverseGeocode", &query).await?;
        Ok(GeocoderResponse::from(raw))
    }

    #[instrument(skip(self, auth_token), fields(query = %params.query))]
    async fn search(
        &self,
        auth_token: &SecretString,
        params: &SearchParams,
    ) -> Result<SearchResponse, MapKitError> {
        let raw: RawSearchResponse = self
            .get(auth_token, "/v1/search", &search_query_params(params))
            .await?;
        let response = raw.into_domain(&params.query);
        if response.is_empty() {
            warn!("Search returned no places");
        }
        Ok(response)
    }

    #[instrument(skip(self, auth_token), fields(query = %params.query))]
    async fn search_autocomplete(
        &self,
        auth_token: &SecretString,
        params: &SearchParams,
    ) -> Result<SearchAutocompleteResponse, MapKitError> {
        let raw: RawAutocompleteResponse = self
            .get(auth_token, "/v1/searchAutocomplete", &search_query_params(params))
            .await?;
        Ok(raw.into_domain(&params.query))
    }

    #[instrument(skip(self, auth_token, request), fields(origin = %request.origin, destination = %request.destination))]
    async fn directions(
        &self,
        auth_token: &SecretString,
        request: &DirectionsRequest,
        language: Option<&str>,
    ) -> Result<DirectionsResponse, MapKitError> {
        let mut query = vec![
            ("origin", format_endpoint(&request.origin)),
            ("destination", format_endpoint(&request.destination)),
            ("transportType", request.transport_type.as_str().to_string()),
            (
                "requestsAlternateRoutes",
                request.requests_alternate_routes.to_string(),
            ),
        ];
        if let Some(departure) = request.departure_date {
            query.push(("departureDate", departure.to_rfc3339()));
        }
        if let Some(arrival) = request.arrival_date {
            query.push(("arrivalDate", arrival.to_rfc3339()));
        }
        if let Some(lang) = language {
            query.push(("lang", lang.to_string()));
        }

        let raw: RawDirectionsResponse = self.get(auth_token, "/v1/directions", &query).await?;
        let response = raw.into_domain(request.clone())?;
        if response.routes.is_empty() {
            return Err(MapKitError::NotFound(format!(
                "No routes from {} to {}",
                request.origin, request.destination
            )));
        }
        debug!(count = response.routes.len(), "Routes found");
        Ok(response)
    }
}
