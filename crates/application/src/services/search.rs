//! Search query object
//!
//! Finds points of interest and addresses and suggests query completions.
//! Results reach the caller either through a one-off callback or through a
//! delegate; exactly one of the success or error paths fires per request.
//! Search requests cannot be cancelled.

use std::fmt;
use std::sync::Arc;

use domain::entities::{SearchAutocompleteResponse, SearchResponse};
use domain::value_objects::{Coordinate, CoordinateRegion, RequestHandle, RequestState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::request_registry::{Callback, DEFAULT_HISTORY_LIMIT, RequestRegistry};
use crate::error::ApplicationError;
use crate::ports::{SearchEngine, SearchQuery};

/// Receives search outcomes
pub trait SearchDelegate: Send + Sync {
    /// Called with the response of a successful search
    fn search_did_complete(&self, response: SearchResponse);

    /// Called when a search fails
    fn search_did_error(&self, error: ApplicationError);
}

/// Receives autocomplete outcomes
pub trait AutocompleteDelegate: Send + Sync {
    /// Called with the suggestions of a successful autocomplete request
    fn autocomplete_did_complete(&self, response: SearchAutocompleteResponse);

    /// Called when an autocomplete request fails
    fn autocomplete_did_error(&self, error: ApplicationError);
}

/// Where a search outcome is delivered
pub enum SearchResultHandler {
    /// One-off callback
    Callback(Callback<SearchResponse>),
    /// Long-lived delegate
    Delegate(Arc<dyn SearchDelegate>),
}

impl SearchResultHandler {
    /// Deliver to a callback
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Result<SearchResponse, ApplicationError>) + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }

    /// Deliver to a delegate
    pub fn delegate(delegate: Arc<dyn SearchDelegate>) -> Self {
        Self::Delegate(delegate)
    }

    fn into_callback(self) -> Callback<SearchResponse> {
        match self {
            Self::Callback(callback) => callback,
            Self::Delegate(delegate) => Box::new(move |result| match result {
                Ok(response) => delegate.search_did_complete(response),
                Err(error) => delegate.search_did_error(error),
            }),
        }
    }
}

impl fmt::Debug for SearchResultHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("SearchResultHandler::Callback"),
            Self::Delegate(_) => f.write_str("SearchResultHandler::Delegate"),
        }
    }
}

/// Where an autocomplete outcome is delivered
pub enum AutocompleteResultHandler {
    /// One-off callback
    Callback(Callback<SearchAutocompleteResponse>),
    /// Long-lived delegate
    Delegate(Arc<dyn AutocompleteDelegate>),
}

impl AutocompleteResultHandler {
    /// Deliver to a callback
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(Result<SearchAutocompleteResponse, ApplicationError>) + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }

    /// Deliver to a delegate
    pub fn delegate(delegate: Arc<dyn AutocompleteDelegate>) -> Self {
        Self::Delegate(delegate)
    }

    fn into_callback(self) -> Callback<SearchAutocompleteResponse> {
        match self {
            Self::Callback(callback) => callback,
            Self::Delegate(delegate) => Box::new(move |result| match result {
                Ok(response) => delegate.autocomplete_did_complete(response),
                Err(error) => delegate.autocomplete_did_error(error),
            }),
        }
    }
}

impl fmt::Debug for AutocompleteResultHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Callback(_) => f.write_str("AutocompleteResultHandler::Callback"),
            Self::Delegate(_) => f.write_str("AutocompleteResultHandler::Delegate"),
        }
    }
}

/// Options fixed when the search object is created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchOptions {
    /// Default result language (BCP 47)
    pub language: Option<String>,
    /// Whether the user location serves as a proximity hint
    pub gets_user_location: bool,
    /// Position used as hint when `gets_user_location` is set and no other
    /// coordinate is given
    pub user_location: Option<Coordinate>,
    /// Default proximity hint
    pub coordinate: Option<Coordinate>,
    /// Default region hint
    pub region: Option<CoordinateRegion>,
    /// Whether points of interest are included
    pub include_points_of_interest: bool,
    /// Whether addresses are included
    pub include_addresses: bool,
    /// ISO 3166-1 alpha-2 codes results are limited to
    pub limit_to_countries: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            language: None,
            gets_user_location: false,
            user_location: None,
            coordinate: None,
            region: None,
            include_points_of_interest: true,
            include_addresses: true,
            limit_to_countries: Vec::new(),
        }
    }
}

/// Options of a single search or autocomplete request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SearchLookupOptions {
    /// Result language, overriding the default
    pub language: Option<String>,
    /// Proximity hint, overriding the default
    pub coordinate: Option<Coordinate>,
    /// Region hint, overriding the default
    pub region: Option<CoordinateRegion>,
}

/// Issues search and autocomplete requests
pub struct Search {
    engine: Arc<dyn SearchEngine>,
    options: SearchOptions,
    registry: Arc<RequestRegistry>,
}

impl fmt::Debug for Search {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Search")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Search {
    /// Create a search object backed by an engine
    #[must_use]
    pub fn new(engine: Arc<dyn SearchEngine>, options: SearchOptions) -> Self {
        Self {
            engine,
            options,
            registry: Arc::new(RequestRegistry::new("search", DEFAULT_HISTORY_LIMIT)),
        }
    }

    /// Keep the outcome of up to `limit` finished requests
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.registry = Arc::new(RequestRegistry::new("search", limit));
        self
    }

    /// Options fixed at creation
    #[must_use]
    pub const fn options(&self) -> &SearchOptions {
        &self.options
    }

    /// Find places matching a query
    ///
    /// The returned handle only serves state inspection. Blank queries fail
    /// through the handler.
    #[instrument(skip(self, handler, options))]
    pub fn search(
        &self,
        query: &str,
        handler: SearchResultHandler,
        options: SearchLookupOptions,
    ) -> RequestHandle {
        let query = self.build_query(query, options);
        let engine = Arc::clone(&self.engine);
        self.registry.issue(
            async move {
                ensure_query(&query)?;
                engine.search(&query).await
            },
            handler.into_callback(),
        )
    }

    /// Suggest completions for a partial query
    ///
    /// The returned handle only serves state inspection. Blank queries fail
    /// through the handler.
    #[instrument(skip(self, handler, options))]
    pub fn autocomplete(
        &self,
        query: &str,
        handler: AutocompleteResultHandler,
        options: SearchLookupOptions,
    ) -> RequestHandle {
        let query = self.build_query(query, options);
        let engine = Arc::clone(&self.engine);
        self.registry.issue(
            async move {
                ensure_query(&query)?;
                engine.autocomplete(&query).await
            },
            handler.into_callback(),
        )
    }

    /// State of a request, `None` if unknown or forgotten
    #[must_use]
    pub fn state(&self, handle: RequestHandle) -> Option<RequestState> {
        self.registry.state(handle)
    }

    fn build_query(&self, text: &str, options: SearchLookupOptions) -> SearchQuery {
        let defaults = &self.options;
        let user_location = defaults.user_location.filter(|_| defaults.gets_user_location);
        SearchQuery {
            text: text.trim().to_string(),
            language: options.language.or_else(|| defaults.language.clone()),
            coordinate: options
                .coordinate
                .or(defaults.coordinate)
                .or(user_location),
            region: options.region.or(defaults.region),
            include_points_of_interest: defaults.include_points_of_interest,
            include_addresses: defaults.include_addresses,
            limit_to_countries: defaults.limit_to_countries.clone(),
        }
    }
}

fn ensure_query(query: &SearchQuery) -> Result<(), ApplicationError> {
    if query.text.is_empty() {
        return Err(ApplicationError::Validation(
            "Search query must not be empty".to_string(),
        ));
    }
    if !query.include_points_of_interest && !query.include_addresses {
        return Err(ApplicationError::Validation(
            "Search excludes both points of interest and addresses".to_string(),
        ));
    }
    Ok(())
}
