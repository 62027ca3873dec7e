//! Command implementations
//!
//! The query objects deliver through callbacks; each command bridges its
//! callback into a oneshot channel and renders the outcome as JSON.

use anyhow::Context;
use application::ApplicationError;
use application::services::{
    AutocompleteResultHandler, GeocoderLookupOptions, GeocoderReverseLookupOptions,
    SearchLookupOptions, SearchResultHandler,
};
use domain::entities::{DirectionsRequest, RouteEndpoint};
use domain::projection;
use domain::value_objects::{Coordinate, TransportType};
use infrastructure::MapServices;
use serde::Serialize;
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// Parse `"lat,lon"` into a validated coordinate
pub fn parse_coordinate(input: &str) -> Result<Coordinate, String> {
    let (lat, lon) = input
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lon\", got \"{input}\""))?;
    let latitude: f64 = lat
        .trim()
        .parse()
        .map_err(|e| format!("invalid latitude \"{lat}\": {e}"))?;
    let longitude: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("invalid longitude \"{lon}\": {e}"))?;
    Coordinate::validated(latitude, longitude).map_err(|e| e.to_string())
}

/// A route endpoint from free text; `"lat,lon"` becomes a coordinate
pub fn parse_endpoint(input: &str) -> RouteEndpoint {
    parse_coordinate(input).map_or_else(|_| RouteEndpoint::from(input), RouteEndpoint::from)
}

/// Build a directions request from command arguments
pub fn directions_request(
    origin: &str,
    destination: &str,
    transport: TransportType,
    alternates: bool,
) -> DirectionsRequest {
    let request = DirectionsRequest::new(parse_endpoint(origin), parse_endpoint(destination))
        .with_transport_type(transport);
    if alternates {
        request.with_alternate_routes()
    } else {
        request
    }
}

type Outcome<T> = Result<T, ApplicationError>;

/// Sender half wrapped as a callback
fn deliver<T: Send + 'static>(tx: oneshot::Sender<Outcome<T>>) -> impl FnOnce(Outcome<T>) + Send {
    move |result| {
        let _ = tx.send(result);
    }
}

async fn render<T: Serialize>(rx: oneshot::Receiver<Outcome<T>>) -> anyhow::Result<Value> {
    let response = rx.await.context("request dropped without result")??;
    Ok(serde_json::to_value(response)?)
}

pub async fn geocode(
    services: &MapServices,
    query: &str,
    near: Option<Coordinate>,
    countries: Vec<String>,
) -> anyhow::Result<Value> {
    let (tx, rx) = oneshot::channel();
    let options = GeocoderLookupOptions {
        coordinate: near,
        limit_to_countries: countries,
        ..GeocoderLookupOptions::default()
    };
    services.geocoder.lookup(query, deliver(tx), options);
    render(rx).await
}

pub async fn reverse(services: &MapServices, coordinate: Coordinate) -> anyhow::Result<Value> {
    let (tx, rx) = oneshot::channel();
    services
        .geocoder
        .reverse_lookup(coordinate, deliver(tx), GeocoderReverseLookupOptions::default());
    render(rx).await
}

fn lookup_options(near: Option<Coordinate>) -> SearchLookupOptions {
    SearchLookupOptions {
        coordinate: near,
        ..SearchLookupOptions::default()
    }
}

pub async fn search(
    services: &MapServices,
    query: &str,
    near: Option<Coordinate>,
) -> anyhow::Result<Value> {
    let (tx, rx) = oneshot::channel();
    services.search.search(
        query,
        SearchResultHandler::callback(deliver(tx)),
        lookup_options(near),
    );
    render(rx).await
}

pub async fn autocomplete(
    services: &MapServices,
    query: &str,
    near: Option<Coordinate>,
) -> anyhow::Result<Value> {
    let (tx, rx) = oneshot::channel();
    services.search.autocomplete(
        query,
        AutocompleteResultHandler::callback(deliver(tx)),
        lookup_options(near),
    );
    render(rx).await
}

pub async fn directions(services: &MapServices, request: DirectionsRequest) -> anyhow::Result<Value> {
    let (tx, rx) = oneshot::channel();
    services.directions.route(request, deliver(tx));
    render(rx).await
}

/// Map point and scale of a position
pub fn project(coordinate: Coordinate) -> Value {
    let point = coordinate.to_map_point();
    json!({
        "coordinate": coordinate,
        "mapPoint": point,
        "metersPerMapUnit": projection::meters_per_map_unit(coordinate.latitude()),
    })
}
