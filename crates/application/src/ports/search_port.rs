//! Search engine port
//!
//! Defines the interface for point-of-interest search and query completion.

use async_trait::async_trait;
use domain::entities::{SearchAutocompleteResponse, SearchResponse};
use domain::value_objects::{Coordinate, CoordinateRegion};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Search or autocomplete query as handed to the engine
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query text, already trimmed
    pub text: String,
    /// Preferred result language (BCP 47)
    pub language: Option<String>,
    /// Hint to prefer results near this position
    pub coordinate: Option<Coordinate>,
    /// Hint to prefer results inside this region
    pub region: Option<CoordinateRegion>,
    /// Whether points of interest are included
    pub include_points_of_interest: bool,
    /// Whether addresses are included
    pub include_addresses: bool,
    /// ISO 3166-1 alpha-2 codes results are limited to
    pub limit_to_countries: Vec<String>,
}

/// Port for the search engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Find places matching a query
    async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, ApplicationError>;

    /// Suggest completions for a partial query
    async fn autocomplete(
        &self,
        query: &SearchQuery,
    ) -> Result<SearchAutocompleteResponse, ApplicationError>;
}
