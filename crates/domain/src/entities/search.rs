//! Search domain entities

use serde::{Deserialize, Serialize};

use super::place::Place;
use crate::value_objects::{BoundingRegion, Coordinate};

/// Result of a point-of-interest or address search
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    /// Query as submitted
    pub query: String,
    /// Matching places
    pub places: Vec<Place>,
    /// Region enclosing all results
    pub bounding_region: Option<BoundingRegion>,
}

impl SearchResponse {
    /// Create a response, deriving the bounding region from the places when absent
    #[must_use]
    pub fn new(
        query: impl Into<String>,
        places: Vec<Place>,
        bounding_region: Option<BoundingRegion>,
    ) -> Self {
        let bounding_region = bounding_region
            .or_else(|| BoundingRegion::enclosing(places.iter().map(|p| &p.coordinate)));
        Self {
            query: query.into(),
            places,
            bounding_region,
        }
    }

    /// Whether nothing matched
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

/// A single query completion suggestion
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchAutocompleteResult {
    /// Lines to display, most significant first
    pub display_lines: Vec<String>,
    /// Position of the suggestion, if it resolves to a single place
    pub coordinate: Option<Coordinate>,
    /// Opaque continuation used to run the completed search
    pub completion_url: Option<String>,
}

impl SearchAutocompleteResult {
    /// Display lines joined with a comma
    #[must_use]
    pub fn display_text(&self) -> String {
        self.display_lines.join(", ")
    }
}

/// Result of an autocomplete request
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchAutocompleteResponse {
    /// Partial query as submitted
    pub query: String,
    /// Suggestions, best first
    pub results: Vec<SearchAutocompleteResult>,
}

impl SearchAutocompleteResponse {
    /// Create a response
    #[must_use]
    pub fn new(query: impl Into<String>, results: Vec<SearchAutocompleteResult>) -> Self {
        Self {
            query: query.into(),
            results,
        }
    }
}
