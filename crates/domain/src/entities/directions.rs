//! Directions domain entities

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::overlay::Overlay;
use super::place::Place;
use crate::errors::DomainError;
use crate::value_objects::{Coordinate, TransportType};

/// Start or end of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum RouteEndpoint {
    /// Free-form address resolved by the engine
    Text(String),
    /// Exact position
    Coordinate(Coordinate),
    /// Previously resolved place
    Place(Box<Place>),
}

impl RouteEndpoint {
    /// Position if known without resolution
    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Text(_) => None,
            Self::Coordinate(c) => Some(*c),
            Self::Place(place) => Some(place.coordinate),
        }
    }

    fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{text}"),
            Self::Coordinate(c) => write!(f, "{c}"),
            Self::Place(place) => write!(f, "{}", place.summary()),
        }
    }
}

impl From<Coordinate> for RouteEndpoint {
    fn from(coordinate: Coordinate) -> Self {
        Self::Coordinate(coordinate)
    }
}

impl From<Place> for RouteEndpoint {
    fn from(place: Place) -> Self {
        Self::Place(Box::new(place))
    }
}

impl From<&str> for RouteEndpoint {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

/// Parameters of a directions request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionsRequest {
    /// Start of the route
    pub origin: RouteEndpoint,
    /// End of the route
    pub destination: RouteEndpoint,
    /// Mode of travel
    #[serde(default)]
    pub transport_type: TransportType,
    /// Whether more than one candidate route is wanted
    #[serde(default)]
    pub requests_alternate_routes: bool,
    /// Planned departure time
    pub departure_date: Option<DateTime<Utc>>,
    /// Planned arrival time
    pub arrival_date: Option<DateTime<Utc>>,
}

impl DirectionsRequest {
    /// Create a request for driving directions without alternates
    #[must_use]
    pub fn new(origin: impl Into<RouteEndpoint>, destination: impl Into<RouteEndpoint>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            transport_type: TransportType::default(),
            requests_alternate_routes: false,
            departure_date: None,
            arrival_date: None,
        }
    }

    /// Set the mode of travel
    #[must_use]
    pub const fn with_transport_type(mut self, transport_type: TransportType) -> Self {
        self.transport_type = transport_type;
        self
    }

    /// Ask for alternate routes
    #[must_use]
    pub const fn with_alternate_routes(mut self) -> Self {
        self.requests_alternate_routes = true;
        self
    }

    /// Set the departure time; clears any arrival time
    #[must_use]
    pub const fn departing_at(mut self, when: DateTime<Utc>) -> Self {
        self.departure_date = Some(when);
        self.arrival_date = None;
        self
    }

    /// Set the arrival time; clears any departure time
    #[must_use]
    pub const fn arriving_at(mut self, when: DateTime<Utc>) -> Self {
        self.arrival_date = Some(when);
        self.departure_date = None;
        self
    }

    /// Check the request before it is handed to the engine
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.origin.is_blank() {
            return Err(DomainError::ValidationError(
                "Directions origin must not be empty".to_string(),
            ));
        }
        if self.destination.is_blank() {
            return Err(DomainError::ValidationError(
                "Directions destination must not be empty".to_string(),
            ));
        }
        if self.departure_date.is_some() && self.arrival_date.is_some() {
            return Err(DomainError::ValidationError(
                "Only one of departure date and arrival date may be set".to_string(),
            ));
        }
        Ok(())
    }
}

/// One maneuver of a route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// Path covered by this step
    pub path: Vec<Coordinate>,
    /// Instruction text, empty for the initial step
    pub instructions: String,
    /// Length of the step
    pub distance_meters: f64,
    /// Expected duration of the step
    pub expected_travel_time_secs: f64,
    /// Mode of travel for the step
    pub transport_type: TransportType,
}

/// A candidate route between origin and destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Descriptive name, usually the main roads taken
    pub name: String,
    /// Total length
    pub distance_meters: f64,
    /// Expected total duration
    pub expected_travel_time_secs: f64,
    /// Mode of travel
    pub transport_type: TransportType,
    /// Whether the route uses toll roads
    #[serde(default)]
    pub has_tolls: bool,
    /// Drawable line along the whole route
    pub polyline: Overlay,
    /// Step paths in order
    pub path: Vec<Vec<Coordinate>>,
    /// Maneuvers in order
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// Assemble a route from its steps
    ///
    /// The polyline overlay joins all step paths, skipping the shared point
    /// where one step ends and the next begins.
    #[must_use]
    pub fn from_steps(
        name: impl Into<String>,
        distance_meters: f64,
        expected_travel_time_secs: f64,
        transport_type: TransportType,
        has_tolls: bool,
        steps: Vec<RouteStep>,
    ) -> Self {
        let path: Vec<Vec<Coordinate>> = steps.iter().map(|s| s.path.clone()).collect();
        let mut points: Vec<Coordinate> = Vec::new();
        for coordinate in path.iter().flatten() {
            if points.last() != Some(coordinate) {
                points.push(*coordinate);
            }
        }
        Self {
            name: name.into(),
            distance_meters,
            expected_travel_time_secs,
            transport_type,
            has_tolls,
            polyline: Overlay::polyline(points),
            path,
            steps,
        }
    }

    /// Expected duration formatted as hours and minutes
    #[must_use]
    pub fn formatted_travel_time(&self) -> String {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let minutes = (self.expected_travel_time_secs.max(0.0) / 60.0).round() as u64;
        if minutes < 60 {
            format!("{minutes} min")
        } else {
            format!("{} h {} min", minutes / 60, minutes % 60)
        }
    }
}

/// Result of a directions request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    /// Request that produced the routes
    pub request: DirectionsRequest,
    /// Candidate routes, preferred first
    pub routes: Vec<Route>,
}

impl DirectionsResponse {
    /// Create a response
    ///
    /// Without `requests_alternate_routes` only the preferred route is kept.
    #[must_use]
    pub fn new(request: DirectionsRequest, mut routes: Vec<Route>) -> Self {
        if !request.requests_alternate_routes {
            routes.truncate(1);
        }
        Self { request, routes }
    }

    /// Preferred route, if any
    #[must_use]
    pub fn preferred(&self) -> Option<&Route> {
        self.routes.first()
    }
}
