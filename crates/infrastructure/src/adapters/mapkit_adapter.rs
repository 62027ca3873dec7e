//! Maps engine adapter - Implements the engine ports using integration_mapkit
//!
//! Obtains the authorization token from the session, retries transient
//! failures with backoff, and refreshes the credential once when the service
//! rejects it.

use std::future::Future;
use std::sync::Arc;

use application::error::ApplicationError;
use application::ports::{
    DirectionsEngine, GeocodeQuery, GeocodingEngine, ReverseGeocodeQuery, RouteQuery, SearchEngine,
    SearchQuery,
};
use application::services::MapKitSession;
use async_trait::async_trait;
use domain::entities::{
    DirectionsResponse, GeocoderResponse, SearchAutocompleteResponse, SearchResponse,
};
use integration_mapkit::{GeocodeParams, MapKitClient, MapKitError, SearchParams};
use secrecy::SecretString;
use tracing::{instrument, warn};

use crate::retry::{RetryConfig, retry};

/// Adapter exposing the maps server API as geocoding, search and directions engines
pub struct MapKitAdapter {
    client: Arc<dyn MapKitClient>,
    session: Arc<MapKitSession>,
    retry: RetryConfig,
}

impl std::fmt::Debug for MapKitAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapKitAdapter")
            .field("session", &self.session)
            .field("retry", &self.retry)
            .finish_non_exhaustive()
    }
}

impl MapKitAdapter {
    /// Create an adapter with the default retry policy
    pub fn new(client: Arc<dyn MapKitClient>, session: Arc<MapKitSession>) -> Self {
        Self {
            client,
            session,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Run a client call with retry, refreshing the credential once on rejection
    async fn call<T, F, Fut>(&self, operation: &'static str, call: F) -> Result<T, ApplicationError>
    where
        F: Fn(SecretString) -> Fut,
        Fut: Future<Output = Result<T, MapKitError>>,
    {
        let token = self.session.authorization_token().await?;
        match retry(&self.retry, || call(token.clone())).await {
            Err(MapKitError::Unauthorized(reason)) => {
                warn!(operation, %reason, "Authorization rejected, refreshing credential");
                self.session.invalidate().await;
                let token = self.session.authorization_token().await?;
                retry(&self.retry, || call(token.clone()))
                    .await
                    .map_err(|e| map_error(operation, e))
            },
            other => other.map_err(|e| map_error(operation, e)),
        }
    }
}

/// Convert a client error into the error delivered to callbacks
fn map_error(operation: &str, err: MapKitError) -> ApplicationError {
    match err {
        MapKitError::Unauthorized(reason) => ApplicationError::NotAuthorized(reason),
        MapKitError::RateLimitExceeded { .. } => ApplicationError::RateLimited,
        MapKitError::BadRequest(reason) => ApplicationError::Validation(reason),
        MapKitError::ConfigurationError(reason) => ApplicationError::Configuration(reason),
        other => ApplicationError::ExternalService(format!("{operation} failed: {other}")),
    }
}

#[async_trait]
impl GeocodingEngine for MapKitAdapter {
    #[instrument(skip(self, query), fields(text = %query.text))]
    async fn geocode(&self, query: &GeocodeQuery) -> Result<GeocoderResponse, ApplicationError> {
        let params = GeocodeParams {
            query: query.text.clone(),
            language: query.language.clone(),
            search_location: query.coordinate,
            search_region: query.region,
            limit_to_countries: query.limit_to_countries.clone(),
        };
        let client = self.client.as_ref();
        let params = &params;
        self.call("geocode", move |token| async move { client.geocode(&token, params).await })
            .await
    }

    #[instrument(skip(self, query), fields(coordinate = %query.coordinate))]
    async fn reverse_geocode(
        &self,
        query: &ReverseGeocodeQuery,
    ) -> Result<GeocoderResponse, ApplicationError> {
        let client = self.client.as_ref();
        let coordinate = query.coordinate;
        let language = query.language.as_deref();
        self.call("reverse geocode", move |token| async move {
            client.reverse_geocode(&token, coordinate, language).await
        })
        .await
    }
}

fn search_params(query: &SearchQuery) -> SearchParams {
    SearchParams {
        query: query.text.clone(),
        language: query.language.clone(),
        search_location: query.coordinate,
        search_region: query.region,
        include_points_of_interest: query.include_points_of_interest,
        include_addresses: query.include_addresses,
        limit_to_countries: query.limit_to_countries.clone(),
    }
}

#[async_trait]
impl SearchEngine for MapKitAdapter {
    #[instrument(skip(self, query), fields(text = %query.text))]
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ApplicationError> {
        let params = search_params(query);
        let client = self.client.as_ref();
        let params = &params;
        self.call("search", move |token| async move { client.search(&token, params).await })
            .await
    }

    #[instrument(skip(self, query), fields(text = %query.text))]
    async fn autocomplete(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchAutocompleteResponse, ApplicationError> {
        let params = search_params(query);
        let client = self.client.as_ref();
        let params = &params;
        self.call("autocomplete", move |token| async move {
            client.search_autocomplete(&token, params).await
        })
        .await
    }
}

#[async_trait]
impl DirectionsEngine for MapKitAdapter {
    #[instrument(skip(self, query), fields(origin = %query.request.origin, destination = %query.request.destination))]
    async fn route(&self, query: &RouteQuery) -> Result<DirectionsResponse, ApplicationError> {
        let client = self.client.as_ref();
        let request = &query.request;
        let language = query.language.as_deref();
        self.call("directions", move |token| async move {
            client.directions(&token, request, language).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use application::ports::{AuthorizationToken, TokenProvider};
    use application::services::SessionOptions;
    use domain::entities::{DirectionsRequest, Place};
    use domain::value_objects::Coordinate;
    use parking_lot::Mutex;
    use secrecy::ExposeSecret;

    use super::*;

    /// Hands out `jwt-1`, `jwt-2`, ... on successive fetches
    #[derive(Debug, Default)]
    struct CountingProvider {
        fetches: AtomicUsize,
    }

    #[async_trait]
    impl TokenProvider for CountingProvider {
        async fn fetch_token(&self) -> Result<AuthorizationToken, ApplicationError> {
            let n = self.fetches.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(AuthorizationToken::new(format!("jwt-{n}")))
        }
    }

    /// Fails with scripted errors, then answers with canned records
    #[derive(Default)]
    struct ScriptedClient {
        failures: Mutex<VecDeque<MapKitError>>,
        tokens: Mutex<Vec<String>>,
        languages: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedClient {
        fn failing_with(errors: Vec<MapKitError>) -> Self {
            Self {
                failures: Mutex::new(errors.into()),
                ..Self::default()
            }
        }

        fn attempt(&self, token: &SecretString, language: Option<&str>) -> Result<(), MapKitError> {
            self.tokens.lock().push(token.expose_secret().to_string());
            self.languages.lock().push(language.map(str::to_string));
            self.failures.lock().pop_front().map_or(Ok(()), Err)
        }

        fn place() -> Place {
            Place::new("Apple Park", Coordinate::new(37.3349, -122.009))
        }
    }

    #[async_trait]
    impl MapKitClient for ScriptedClient {
        async fn geocode(
            &self,
            auth_token: &SecretString,
            params: &GeocodeParams,
        ) -> Result<GeocoderResponse, MapKitError> {
            self.attempt(auth_token, params.language.as_deref())?;
            Ok(GeocoderResponse::new(vec![Self::place()]))
        }

        async fn reverse_geocode(
            &self,
            auth_token: &SecretString,
            _coordinate: Coordinate,
            language: Option<&str>,
        ) -> Result<GeocoderResponse, MapKitError> {
            self.attempt(auth_token, language)?;
            Ok(GeocoderResponse::new(vec![Self::place()]))
        }

        async fn search(
            &self,
            auth_token: &SecretString,
            params: &SearchParams,
        ) -> Result<SearchResponse, MapKitError> {
            self.attempt(auth_token, params.language.as_deref())?;
            Ok(SearchResponse::new(params.query.clone(), vec![Self::place()], None))
        }

        async fn search_autocomplete(
            &self,
            auth_token: &SecretString,
            params: &SearchParams,
        ) -> Result<SearchAutocompleteResponse, MapKitError> {
            self.attempt(auth_token, params.language.as_deref())?;
            Ok(SearchAutocompleteResponse::new(params.query.clone(), Vec::new()))
        }

        async fn directions(
            &self,
            auth_token: &SecretString,
            request: &DirectionsRequest,
            language: Option<&str>,
        ) -> Result<DirectionsResponse, MapKitError> {
            self.attempt(auth_token, language)?;
            Ok(DirectionsResponse::new(request.clone(), Vec::new()))
        }
    }

    fn adapter(client: &Arc<ScriptedClient>) -> MapKitAdapter {
        let session = MapKitSession::init(
            Arc::new(CountingProvider::default()),
            SessionOptions::default(),
        );
        MapKitAdapter::new(Arc::clone(client) as Arc<dyn MapKitClient>, Arc::new(session))
            .with_retry(RetryConfig::new(1, 2, 2.0, 2).without_jitter())
    }

    fn geocode_query(text: &str) -> GeocodeQuery {
        GeocodeQuery {
            text: text.to_string(),
            language: Some("en".to_string()),
            coordinate: None,
            region: None,
            limit_to_countries: Vec::new(),
        }
    }

    #[tokio::test]
    async fn passes_session_token_and_language() {
        let client = Arc::new(ScriptedClient::default());
        let response = adapter(&client).geocode(&geocode_query("Apple Park")).await.unwrap();

        assert_eq!(response.results.len(), 1);
        assert_eq!(*client.tokens.lock(), vec!["jwt-1".to_string()]);
        assert_eq!(*client.languages.lock(), vec![Some("en".to_string())]);
    }

    #[tokio::test]
    async fn retries_transient_failures() {
        let client = Arc::new(ScriptedClient::failing_with(vec![
            MapKitError::ServiceUnavailable("HTTP 503".into()),
            MapKitError::Timeout { timeout_secs: 1 },
        ]));
        let result = adapter(&client)
            .search(&SearchQuery {
                text: "coffee".to_string(),
                language: None,
                coordinate: None,
                region: None,
                include_points_of_interest: true,
                include_addresses: true,
                limit_to_countries: Vec::new(),
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(client.tokens.lock().len(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_map_to_external_service() {
        let client = Arc::new(ScriptedClient::failing_with(vec![
            MapKitError::ConnectionFailed("reset".into()),
            MapKitError::ConnectionFailed("reset".into()),
            MapKitError::ConnectionFailed("reset".into()),
        ]));
        let result = adapter(&client).geocode(&geocode_query("x")).await;
        assert!(matches!(result, Err(ApplicationError::ExternalService(_))));
    }

    #[tokio::test]
    async fn rejected_credential_is_refreshed_once() {
        let client = Arc::new(ScriptedClient::failing_with(vec![MapKitError::Unauthorized(
            "HTTP 401".into(),
        )]));
        let result = adapter(&client)
            .route(&RouteQuery {
                request: DirectionsRequest::new("A", "B"),
                language: Some("de".to_string()),
            })
            .await;

        assert!(result.is_ok());
        assert_eq!(*client.tokens.lock(), vec!["jwt-1".to_string(), "jwt-2".to_string()]);
    }

    #[tokio::test]
    async fn repeated_rejection_is_not_authorized() {
        let client = Arc::new(ScriptedClient::failing_with(vec![
            MapKitError::Unauthorized("HTTP 401".into()),
            MapKitError::Unauthorized("HTTP 401".into()),
        ]));
        let result = adapter(&client)
            .reverse_geocode(&ReverseGeocodeQuery {
                coordinate: Coordinate::new(37.3349, -122.009),
                language: None,
            })
            .await;

        assert!(matches!(result, Err(ApplicationError::NotAuthorized(_))));
        assert_eq!(client.tokens.lock().len(), 2);
    }

    #[test]
    fn error_mapping() {
        assert!(matches!(
            map_error("search", MapKitError::RateLimitExceeded { retry_after_secs: None }),
            ApplicationError::RateLimited
        ));
        assert!(matches!(
            map_error("search", MapKitError::BadRequest("q".into())),
            ApplicationError::Validation(_)
        ));
        let err = map_error("search", MapKitError::NotFound("/v1/search".into()));
        assert!(err.to_string().contains("search failed"));
    }
}
