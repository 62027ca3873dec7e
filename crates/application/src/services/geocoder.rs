//! Geocoder query object
//!
//! Turns addresses into places and coordinates into addresses through the
//! geocoding engine. Every lookup is a single-shot asynchronous request
//! whose outcome reaches the caller through exactly one callback.

use std::sync::Arc;

use domain::entities::GeocoderResponse;
use domain::value_objects::{Coordinate, CoordinateRegion, RequestHandle, RequestState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::request_registry::{Callback, DEFAULT_HISTORY_LIMIT, RequestRegistry};
use crate::error::ApplicationError;
use crate::ports::{GeocodeQuery, GeocodingEngine, ReverseGeocodeQuery};

/// Options fixed when the geocoder is created
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeocoderOptions {
    /// Default result language (BCP 47)
    pub language: Option<String>,
    /// Whether the user location serves as a proximity hint
    pub gets_user_location: bool,
    /// Position used as hint when `gets_user_location` is set and a lookup
    /// gives no coordinate of its own
    pub user_location: Option<Coordinate>,
}

/// Options of a single forward lookup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeocoderLookupOptions {
    /// Result language, overriding the geocoder default
    pub language: Option<String>,
    /// Prefer results near this position
    pub coordinate: Option<Coordinate>,
    /// Prefer results inside this region
    pub region: Option<CoordinateRegion>,
    /// ISO 3166-1 alpha-2 codes results are limited to
    pub limit_to_countries: Vec<String>,
}

/// Options of a single reverse lookup
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeocoderReverseLookupOptions {
    /// Result language, overriding the geocoder default
    pub language: Option<String>,
}

/// Issues forward and reverse geocoding requests
pub struct Geocoder {
    engine: Arc<dyn GeocodingEngine>,
    options: GeocoderOptions,
    registry: Arc<RequestRegistry>,
}

impl std::fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geocoder")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Geocoder {
    /// Create a geocoder backed by an engine
    #[must_use]
    pub fn new(engine: Arc<dyn GeocodingEngine>, options: GeocoderOptions) -> Self {
        Self {
            engine,
            options,
            registry: Arc::new(RequestRegistry::new("geocoder", DEFAULT_HISTORY_LIMIT)),
        }
    }

    /// Keep the outcome of up to `limit` finished requests
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.registry = Arc::new(RequestRegistry::new("geocoder", limit));
        self
    }

    /// Options fixed at creation
    #[must_use]
    pub const fn options(&self) -> &GeocoderOptions {
        &self.options
    }

    /// Resolve an address or place name
    ///
    /// Returns a handle at once; `callback` receives the outcome exactly
    /// once unless the request is cancelled first. Blank text fails through
    /// the callback.
    #[instrument(skip(self, callback, options))]
    pub fn lookup<F>(&self, text: &str, callback: F, options: GeocoderLookupOptions) -> RequestHandle
    where
        F: FnOnce(Result<GeocoderResponse, ApplicationError>) + Send + 'static,
    {
        let text = text.trim().to_string();
        let query = GeocodeQuery {
            coordinate: options.coordinate.or_else(|| self.user_location_hint()),
            language: options.language.or_else(|| self.options.language.clone()),
            region: options.region,
            limit_to_countries: options.limit_to_countries,
            text,
        };
        let engine = Arc::clone(&self.engine);
        let callback: Callback<GeocoderResponse> = Box::new(callback);

        self.registry.issue(
            async move {
                if query.text.is_empty() {
                    return Err(ApplicationError::Validation(
                        "Geocoder lookup text must not be empty".to_string(),
                    ));
                }
                engine.geocode(&query).await
            },
            callback,
        )
    }

    /// Describe the places at a position
    ///
    /// The outcome reaches `callback` exactly once. No handle is returned,
    /// so reverse lookups cannot be cancelled.
    #[instrument(skip(self, callback, options))]
    pub fn reverse_lookup<F>(
        &self,
        coordinate: Coordinate,
        callback: F,
        options: GeocoderReverseLookupOptions,
    ) where
        F: FnOnce(Result<GeocoderResponse, ApplicationError>) + Send + 'static,
    {
        let query = ReverseGeocodeQuery {
            coordinate,
            language: options.language.or_else(|| self.options.language.clone()),
        };
        let engine = Arc::clone(&self.engine);
        let callback: Callback<GeocoderResponse> = Box::new(callback);

        self.registry.issue(
            async move {
                Coordinate::validated(query.coordinate.latitude(), query.coordinate.longitude())?;
                engine.reverse_geocode(&query).await
            },
            callback,
        );
    }

    /// Cancel a pending lookup
    ///
    /// Returns whether the request was still pending. Cancelling a finished
    /// or unknown request does nothing.
    pub fn cancel(&self, handle: RequestHandle) -> bool {
        self.registry.cancel(handle)
    }

    /// State of a lookup, `None` if unknown or forgotten
    #[must_use]
    pub fn state(&self, handle: RequestHandle) -> Option<RequestState> {
        self.registry.state(handle)
    }

    fn user_location_hint(&self) -> Option<Coordinate> {
        self.options
            .user_location
            .filter(|_| self.options.gets_user_location)
    }
}
