//! Directions query object
//!
//! Requests candidate routes between two endpoints from the directions
//! engine. Each request is single-shot and cancellable until it completes.

use std::fmt;
use std::sync::Arc;

use domain::entities::{DirectionsRequest, DirectionsResponse};
use domain::value_objects::{RequestHandle, RequestState};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::request_registry::{Callback, DEFAULT_HISTORY_LIMIT, RequestRegistry};
use crate::error::ApplicationError;
use crate::ports::{DirectionsEngine, RouteQuery};

/// Options fixed when the directions object is created
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectionsOptions {
    /// Instruction language (BCP 47)
    pub language: Option<String>,
}

/// Issues route requests
pub struct Directions {
    engine: Arc<dyn DirectionsEngine>,
    options: DirectionsOptions,
    registry: Arc<RequestRegistry>,
}

impl fmt::Debug for Directions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directions")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Directions {
    /// Create a directions object backed by an engine
    #[must_use]
    pub fn new(engine: Arc<dyn DirectionsEngine>, options: DirectionsOptions) -> Self {
        Self {
            engine,
            options,
            registry: Arc::new(RequestRegistry::new("directions", DEFAULT_HISTORY_LIMIT)),
        }
    }

    /// Keep the outcome of up to `limit` finished requests
    #[must_use]
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.registry = Arc::new(RequestRegistry::new("directions", limit));
        self
    }

    /// Options fixed at creation
    #[must_use]
    pub const fn options(&self) -> &DirectionsOptions {
        &self.options
    }

    /// Request routes for `request`
    ///
    /// Returns a handle at once. The callback receives the candidate routes,
    /// preferred first, or the error. Invalid requests fail through the
    /// callback.
    #[instrument(skip(self, callback), fields(transport = %request.transport_type))]
    pub fn route<F>(&self, request: DirectionsRequest, callback: F) -> RequestHandle
    where
        F: FnOnce(Result<DirectionsResponse, ApplicationError>) + Send + 'static,
    {
        let query = RouteQuery {
            request,
            language: self.options.language.clone(),
        };
        let engine = Arc::clone(&self.engine);
        let callback: Callback<DirectionsResponse> = Box::new(callback);

        self.registry.issue(
            async move {
                query.request.validate()?;
                let response = engine.route(&query).await?;
                // Engines may ignore the alternates flag
                Ok(DirectionsResponse::new(query.request, response.routes))
            },
            callback,
        )
    }

    /// Cancel a pending route request
    ///
    /// Returns whether the request was still pending. Cancelling a finished
    /// or unknown request does nothing.
    pub fn cancel(&self, handle: RequestHandle) -> bool {
        self.registry.cancel(handle)
    }

    /// State of a request, `None` if unknown or forgotten
    #[must_use]
    pub fn state(&self, handle: RequestHandle) -> Option<RequestState> {
        self.registry.state(handle)
    }
}
