//! End-to-end tests for the wired map services
//!
//! Query objects, engine adapter and HTTP client run against a wiremock
//! server standing in for the maps server API.

use std::sync::Arc;

use application::ApplicationError;
use application::services::{
    GeocoderLookupOptions, GeocoderReverseLookupOptions, SearchLookupOptions, SearchResultHandler,
};
use domain::entities::{DirectionsRequest, GeocoderResponse};
use domain::value_objects::{Coordinate, RequestState};
use integration_mapkit::{HttpMapKitClient, MapKitClient, MapKitConfig};
use secrecy::SecretString;
use tokio::sync::oneshot;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use infrastructure::{AppConfig, MapServices, RetryConfig, StaticTokenProvider};

const PLACE_JSON: &str = r#"{
    "results": [{
        "name": "Apple Park",
        "coordinate": { "latitude": 37.3349, "longitude": -122.009 },
        "formattedAddressLines": ["1 Apple Park Way", "Cupertino, CA 95014"],
        "countryCode": "US"
    }]
}"#;

async fn mount_token(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .and(header("authorization", "Bearer host-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "accessToken": "access-1", "expiresInSeconds": 1800 }"#,
        ))
        .mount(server)
        .await;
}

fn services(server: &MockServer, language: Option<&str>) -> MapServices {
    let mut config = AppConfig::default();
    config.mapkit.language = language.map(str::to_string);
    config.retry = RetryConfig::new(1, 5, 2.0, 2).without_jitter();

    let client_config = MapKitConfig {
        base_url: server.uri(),
        ..MapKitConfig::for_testing()
    };
    let client: Arc<dyn MapKitClient> = Arc::new(HttpMapKitClient::new(&client_config).unwrap());
    let provider = Arc::new(StaticTokenProvider::new(SecretString::from(
        "host-jwt".to_string(),
    )));
    MapServices::with_parts(&config, provider, client)
}

#[tokio::test]
async fn lookup_delivers_places_in_session_language() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .and(query_param("q", "Apple Park"))
        .and(query_param("lang", "en-GB"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLACE_JSON))
        .expect(1)
        .mount(&server)
        .await;

    let services = services(&server, Some("en-GB"));
    let (tx, rx) = oneshot::channel();
    let handle = services.geocoder.lookup(
        "Apple Park",
        move |result| {
            let _ = tx.send(result);
        },
        GeocoderLookupOptions::default(),
    );

    let response = rx.await.unwrap().unwrap();
    assert_eq!(response.results[0].name, "Apple Park");
    assert_eq!(response.results[0].country_code.as_deref(), Some("US"));
    assert_eq!(services.geocoder.state(handle), Some(RequestState::Completed));
}

#[tokio::test]
async fn reverse_lookup_sends_location() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/reverseGeocode"))
        .and(query_param("loc", "37.3349,-122.009"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLACE_JSON))
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel::<Result<GeocoderResponse, ApplicationError>>();
    services.geocoder.reverse_lookup(
        Coordinate::new(37.3349, -122.009),
        move |result| {
            let _ = tx.send(result);
        },
        GeocoderReverseLookupOptions::default(),
    );

    let response = rx.await.unwrap().unwrap();
    assert_eq!(response.first().unwrap().name, "Apple Park");
}

#[tokio::test]
async fn transient_server_errors_are_retried() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "coffee"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PLACE_JSON))
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel();
    services.search.search(
        "coffee",
        SearchResultHandler::callback(move |result| {
            let _ = tx.send(result);
        }),
        SearchLookupOptions::default(),
    );

    let response = rx.await.unwrap().unwrap();
    assert_eq!(response.query, "coffee");
    assert_eq!(response.places.len(), 1);
    assert!(response.bounding_region.is_some());
}

#[tokio::test]
async fn rate_limit_surfaces_after_retries() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "1"))
        .expect(3)
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel();
    services.geocoder.lookup(
        "Apple Park",
        move |result| {
            let _ = tx.send(result);
        },
        GeocoderLookupOptions::default(),
    );

    assert!(matches!(rx.await.unwrap(), Err(ApplicationError::RateLimited)));
}

#[tokio::test]
async fn rejected_host_token_is_not_authorized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel();
    services.geocoder.lookup(
        "Apple Park",
        move |result| {
            let _ = tx.send(result);
        },
        GeocoderLookupOptions::default(),
    );

    assert!(matches!(
        rx.await.unwrap(),
        Err(ApplicationError::NotAuthorized(_))
    ));
}

#[tokio::test]
async fn directions_pick_preferred_route() {
    let server = MockServer::start().await;
    mount_token(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .and(query_param("origin", "Cupertino"))
        .and(query_param("destination", "San Francisco"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "routes": [
                    { "name": "I-280 N", "distanceMeters": 72000, "durationSeconds": 3000,
                      "transportType": "Automobile", "stepIndexes": [0] },
                    { "name": "US-101 N", "distanceMeters": 70000, "durationSeconds": 3300,
                      "transportType": "Automobile", "stepIndexes": [0] }
                ],
                "steps": [
                    { "stepPathIndex": 0, "distanceMeters": 72000, "durationSeconds": 3000,
                      "instructions": "Merge onto I-280 N" }
                ],
                "stepPaths": [
                    [{ "latitude": 37.3349, "longitude": -122.009 },
                     { "latitude": 37.7749, "longitude": -122.4194 }]
                ]
            }"#,
        ))
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel();
    services.directions.route(
        DirectionsRequest::new("Cupertino", "San Francisco"),
        move |result| {
            let _ = tx.send(result);
        },
    );

    let response = rx.await.unwrap().unwrap();
    assert_eq!(response.routes.len(), 1);
    assert_eq!(response.routes[0].name, "I-280 N");
}

#[tokio::test]
async fn blank_lookup_never_reaches_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let services = services(&server, None);
    let (tx, rx) = oneshot::channel();
    services.geocoder.lookup(
        "   ",
        move |result| {
            let _ = tx.send(result);
        },
        GeocoderLookupOptions::default(),
    );

    assert!(matches!(rx.await.unwrap(), Err(ApplicationError::Validation(_))));
}
