//! Integration tests for the maps server API client (wiremock-based)

use domain::entities::DirectionsRequest;
use domain::value_objects::{Coordinate, TransportType};
use secrecy::SecretString;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_mapkit::{
    GeocodeParams, HttpMapKitClient, MapKitClient, MapKitConfig, MapKitError, SearchParams,
};

fn config_for_mock(base_url: &str) -> MapKitConfig {
    MapKitConfig {
        base_url: base_url.to_string(),
        ..MapKitConfig::for_testing()
    }
}

fn auth_token() -> SecretString {
    SecretString::from("host-jwt".to_string())
}

async fn mount_token(server: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .and(header("authorization", "Bearer host-jwt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{ "accessToken": "{access_token}", "expiresInSeconds": 1800 }}"#
        )))
        .mount(server)
        .await;
}

const fn sample_geocode_json() -> &'static str {
    r#"{
        "results": [{
            "name": "Apple Park",
            "coordinate": { "latitude": 37.3349, "longitude": -122.009 },
            "displayMapRegion": {
                "northLatitude": 37.3394, "eastLongitude": -122.0033,
                "southLatitude": 37.3304, "westLongitude": -122.0147
            },
            "formattedAddressLines": ["1 Apple Park Way", "Cupertino, CA 95014", "United States"],
            "country": "United States",
            "countryCode": "US",
            "structuredAddress": {
                "administrativeArea": "California",
                "administrativeAreaCode": "CA",
                "locality": "Cupertino",
                "postCode": "95014",
                "thoroughfare": "Apple Park Way",
                "subThoroughfare": "1",
                "fullThoroughfare": "1 Apple Park Way"
            }
        }]
    }"#
}

const fn sample_search_json() -> &'static str {
    r#"{
        "displayMapRegion": {
            "northLatitude": 37.5, "eastLongitude": -121.9,
            "southLatitude": 37.2, "westLongitude": -122.2
        },
        "results": [
            {
                "name": "Philz Coffee",
                "coordinate": { "latitude": 37.3230, "longitude": -122.0322 },
                "formattedAddressLines": ["20686 Stevens Creek Blvd", "Cupertino, CA 95014"],
                "poiCategory": "Cafe"
            },
            {
                "name": "Blue Bottle Coffee",
                "coordinate": { "latitude": 37.3318, "longitude": -122.0302 },
                "formattedAddressLines": ["10 Infinite Loop", "Cupertino, CA 95014"],
                "poiCategory": "Cafe"
            }
        ]
    }"#
}

const fn sample_directions_json() -> &'static str {
    r#"{
        "origin": { "coordinate": { "latitude": 37.3349, "longitude": -122.009 } },
        "destination": { "coordinate": { "latitude": 37.7749, "longitude": -122.4194 } },
        "routes": [
            {
                "name": "I-280 N", "distanceMeters": 72000, "durationSeconds": 3000,
                "transportType": "Automobile", "stepIndexes": [0, 1], "hasTolls": false
            },
            {
                "name": "US-101 N", "distanceMeters": 70000, "durationSeconds": 3300,
                "transportType": "Automobile", "stepIndexes": [2], "hasTolls": false
            }
        ],
        "steps": [
            { "stepPathIndex": 0, "distanceMeters": 2000, "durationSeconds": 180, "instructions": "Turn left onto Wolfe Rd" },
            { "stepPathIndex": 1, "distanceMeters": 70000, "durationSeconds": 2820, "instructions": "Merge onto I-280 N" },
            { "stepPathIndex": 2, "distanceMeters": 70000, "durationSeconds": 3300, "instructions": "Take US-101 N" }
        ],
        "stepPaths": [
            [{ "latitude": 37.3349, "longitude": -122.009 }, { "latitude": 37.33, "longitude": -122.01 }],
            [{ "latitude": 37.33, "longitude": -122.01 }, { "latitude": 37.7749, "longitude": -122.4194 }],
            [{ "latitude": 37.3349, "longitude": -122.009 }, { "latitude": 37.7749, "longitude": -122.4194 }]
        ]
    }"#
}

#[tokio::test]
async fn geocode_parses_places() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .and(query_param("q", "1 Apple Park Way"))
        .and(query_param("lang", "en-US"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_geocode_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let params = GeocodeParams {
        query: "1 Apple Park Way".to_string(),
        language: Some("en-US".to_string()),
        ..GeocodeParams::default()
    };

    let response = client.geocode(&auth_token(), &params).await.unwrap();
    let place = response.first().unwrap();
    assert_eq!(place.name, "Apple Park");
    assert_eq!(place.country_code.as_deref(), Some("US"));
    assert_eq!(place.administrative_area_code.as_deref(), Some("CA"));
    assert_eq!(place.full_thoroughfare.as_deref(), Some("1 Apple Park Way"));
    assert!(place.region.is_some());
}

#[tokio::test]
async fn geocode_is_cached_when_enabled() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_geocode_json()))
        .expect(1)
        .mount(&server)
        .await;

    let config = MapKitConfig {
        cache_ttl_secs: 60,
        ..config_for_mock(&server.uri())
    };
    let client = HttpMapKitClient::new(&config).unwrap();
    let params = GeocodeParams {
        query: "Apple Park".to_string(),
        ..GeocodeParams::default()
    };

    client.geocode(&auth_token(), &params).await.unwrap();
    let again = client.geocode(&auth_token(), &params).await.unwrap();
    assert_eq!(again.results.len(), 1);
}

#[tokio::test]
async fn access_token_is_reused_across_calls() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{ "accessToken": "access-1", "expiresInSeconds": 1800 }"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/reverseGeocode"))
        .and(query_param("loc", "37.3349,-122.009"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_geocode_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let coordinate = Coordinate::new(37.3349, -122.009);
    client.reverse_geocode(&auth_token(), coordinate, None).await.unwrap();
    client.reverse_geocode(&auth_token(), coordinate, None).await.unwrap();
}

#[tokio::test]
async fn oversized_token_lifetime_is_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{ "accessToken": "access-1", "expiresInSeconds": 18446744073709551615 }"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_geocode_json()))
        .expect(2)
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let params = GeocodeParams {
        query: "Apple Park".to_string(),
        ..GeocodeParams::default()
    };
    client.geocode(&auth_token(), &params).await.unwrap();
    let again = client.geocode(&auth_token(), &params).await.unwrap();
    assert_eq!(again.results[0].name, "Apple Park");
}

#[tokio::test]
async fn rejected_access_token_is_exchanged_again() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"{ "accessToken": "access-1", "expiresInSeconds": 1800 }"#),
        )
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(401))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_geocode_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let params = GeocodeParams {
        query: "Apple Park".to_string(),
        ..GeocodeParams::default()
    };
    let response = client.geocode(&auth_token(), &params).await.unwrap();
    assert_eq!(response.results.len(), 1);
}

#[tokio::test]
async fn rejected_authorization_token_is_unauthorized() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let result = client
        .search(&auth_token(), &SearchParams {
            query: "coffee".to_string(),
            ..SearchParams::default()
        })
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, MapKitError::Unauthorized(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn search_parses_places_and_region() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .and(query_param("q", "coffee"))
        .and(query_param("resultTypeFilter", "Poi,Address"))
        .and(query_param("searchLocation", "37.33,-122.03"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_search_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let params = SearchParams {
        query: "coffee".to_string(),
        search_location: Some(Coordinate::new(37.33, -122.03)),
        ..SearchParams::default()
    };

    let response = client.search(&auth_token(), &params).await.unwrap();
    assert_eq!(response.query, "coffee");
    assert_eq!(response.places.len(), 2);
    assert_eq!(response.places[0].point_of_interest_category.as_deref(), Some("Cafe"));
    let region = response.bounding_region.unwrap();
    assert!((region.north_latitude - 37.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn autocomplete_parses_suggestions() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/searchAutocomplete"))
        .and(query_param("q", "phil"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{
                "results": [{
                    "completionUrl": "/v1/search?q=Philz%20Coffee",
                    "displayLines": ["Philz Coffee", "Cupertino, CA"],
                    "location": { "latitude": 37.3230, "longitude": -122.0322 }
                }]
            }"#,
        ))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let params = SearchParams {
        query: "phil".to_string(),
        ..SearchParams::default()
    };

    let response = client.search_autocomplete(&auth_token(), &params).await.unwrap();
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].display_lines[0], "Philz Coffee");
    assert!(response.results[0].coordinate.is_some());
}

#[tokio::test]
async fn directions_returns_preferred_route_only() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .and(query_param("origin", "Cupertino"))
        .and(query_param("destination", "37.7749,-122.4194"))
        .and(query_param("transportType", "Automobile"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_directions_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let request = DirectionsRequest::new("Cupertino", Coordinate::new(37.7749, -122.4194));

    let response = client.directions(&auth_token(), &request, None).await.unwrap();
    assert_eq!(response.routes.len(), 1);
    let route = response.preferred().unwrap();
    assert_eq!(route.name, "I-280 N");
    assert_eq!(route.steps.len(), 2);
    assert_eq!(route.transport_type, TransportType::Automobile);
}

#[tokio::test]
async fn directions_keeps_alternates_when_requested() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .and(query_param("requestsAlternateRoutes", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_directions_json()))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let request = DirectionsRequest::new("Cupertino", "San Francisco").with_alternate_routes();

    let response = client.directions(&auth_token(), &request, None).await.unwrap();
    assert_eq!(response.routes.len(), 2);
    assert_eq!(response.routes[1].name, "US-101 N");
}

#[tokio::test]
async fn directions_without_routes_is_not_found() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/directions"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{ "routes": [] }"#))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let result = client
        .directions(&auth_token(), &DirectionsRequest::new("A", "B"), None)
        .await;
    assert!(matches!(result, Err(MapKitError::NotFound(_))));
}

#[tokio::test]
async fn rate_limit_is_retryable() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/search"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .search(&auth_token(), &SearchParams {
            query: "coffee".to_string(),
            ..SearchParams::default()
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        MapKitError::RateLimitExceeded {
            retry_after_secs: Some(30)
        }
    ));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn server_error_is_service_unavailable() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .geocode(&auth_token(), &GeocodeParams {
            query: "x".to_string(),
            ..GeocodeParams::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MapKitError::ServiceUnavailable(_)));
}

#[tokio::test]
async fn malformed_body_is_parse_error() {
    let server = MockServer::start().await;
    mount_token(&server, "access-1").await;

    Mock::given(method("GET"))
        .and(path("/v1/geocode"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = HttpMapKitClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .geocode(&auth_token(), &GeocodeParams {
            query: "x".to_string(),
            ..GeocodeParams::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, MapKitError::ParseError(_)));
}
