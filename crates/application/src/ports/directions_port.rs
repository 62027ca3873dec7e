//! Directions engine port
//!
//! Defines the interface for route computation. The routing algorithm
//! itself stays with the external engine.

use async_trait::async_trait;
use domain::entities::{DirectionsRequest, DirectionsResponse};
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Directions request together with per-session settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteQuery {
    /// Origin, destination and travel parameters
    pub request: DirectionsRequest,
    /// Preferred instruction language (BCP 47)
    pub language: Option<String>,
}

/// Port for the directions engine
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DirectionsEngine: Send + Sync {
    /// Compute candidate routes, preferred first
    async fn route(&self, query: &RouteQuery) -> Result<DirectionsResponse, ApplicationError>;
}
