//! Wiring of the session, the engine adapter and the query objects

use std::sync::Arc;

use application::ports::{DirectionsEngine, GeocodingEngine, SearchEngine, TokenProvider};
use application::services::{
    Directions, DirectionsOptions, Geocoder, GeocoderOptions, MapKitSession, Search, SearchOptions,
};
use integration_mapkit::{HttpMapKitClient, MapKitClient, MapKitError};
use thiserror::Error;
use tracing::info;

use crate::adapters::{EnvTokenProvider, MapKitAdapter, StaticTokenProvider};
use crate::config::AppConfig;

/// Failure to assemble the services
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The HTTP client could not be built
    #[error("Maps client setup failed: {0}")]
    Client(#[from] MapKitError),
}

/// Ready-to-use query objects sharing one session
#[derive(Debug)]
pub struct MapServices {
    /// Shared authorization session
    pub session: Arc<MapKitSession>,
    /// Forward and reverse geocoding
    pub geocoder: Geocoder,
    /// Place search and autocomplete
    pub search: Search,
    /// Route planning
    pub directions: Directions,
}

impl MapServices {
    /// Build everything from configuration
    ///
    /// The token comes from `mapkit.auth_token` when set, otherwise from the
    /// `MAPFRAME_AUTH_TOKEN` environment variable at fetch time.
    pub fn from_config(config: &AppConfig) -> Result<Self, BootstrapError> {
        let provider: Arc<dyn TokenProvider> = match &config.mapkit.auth_token {
            Some(token) => Arc::new(StaticTokenProvider::new(token.clone())),
            None => Arc::new(EnvTokenProvider::default()),
        };
        let client: Arc<dyn MapKitClient> = Arc::new(HttpMapKitClient::new(&config.mapkit.client)?);
        Ok(Self::with_parts(config, provider, client))
    }

    /// Build from explicit token provider and client
    pub fn with_parts(
        config: &AppConfig,
        provider: Arc<dyn TokenProvider>,
        client: Arc<dyn MapKitClient>,
    ) -> Self {
        let session = Arc::new(MapKitSession::init(provider, config.mapkit.session_options()));
        let adapter = Arc::new(
            MapKitAdapter::new(client, Arc::clone(&session)).with_retry(config.retry.clone()),
        );
        let history = config.requests.history_limit;

        let geocoder = session
            .geocoder(
                Arc::clone(&adapter) as Arc<dyn GeocodingEngine>,
                GeocoderOptions::default(),
            )
            .with_history_limit(history);
        let search = session
            .search(Arc::clone(&adapter) as Arc<dyn SearchEngine>, SearchOptions::default())
            .with_history_limit(history);
        let directions = session
            .directions(adapter as Arc<dyn DirectionsEngine>, DirectionsOptions::default())
            .with_history_limit(history);

        info!(
            base_url = %config.mapkit.client.base_url,
            history_limit = history,
            "Map services ready"
        );

        Self {
            session,
            geocoder,
            search,
            directions,
        }
    }
}
