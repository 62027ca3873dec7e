//! Mapping session
//!
//! Holds the authorization credential obtained from the host application's
//! token provider and hands out query objects configured for the session.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use super::directions::{Directions, DirectionsOptions};
use super::geocoder::{Geocoder, GeocoderOptions};
use super::search::{Search, SearchOptions};
use crate::error::ApplicationError;
use crate::ports::{AuthorizationToken, DirectionsEngine, GeocodingEngine, SearchEngine, TokenProvider};

/// Largest accepted refresh leeway; larger values are clamped
pub const MAX_REFRESH_LEEWAY_SECS: u64 = 86_400;

fn default_refresh_leeway_secs() -> u64 {
    30
}

/// Session-wide options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionOptions {
    /// Default language for query objects created by the session
    #[serde(default)]
    pub language: Option<String>,
    /// Refresh a credential this many seconds before it expires
    #[serde(default = "default_refresh_leeway_secs")]
    pub refresh_leeway_secs: u64,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            language: None,
            refresh_leeway_secs: default_refresh_leeway_secs(),
        }
    }
}

impl SessionOptions {
    /// Set the session language
    #[must_use]
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Explicit session state replacing a process-wide initialisation
pub struct MapKitSession {
    provider: Arc<dyn TokenProvider>,
    options: SessionOptions,
    token: Mutex<Option<AuthorizationToken>>,
}

impl fmt::Debug for MapKitSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapKitSession")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl MapKitSession {
    /// Start a session; the provider is first called on demand
    #[must_use]
    pub fn init(provider: Arc<dyn TokenProvider>, options: SessionOptions) -> Self {
        info!(language = ?options.language, "Mapping session initialised");
        Self {
            provider,
            options,
            token: Mutex::new(None),
        }
    }

    /// Session options
    #[must_use]
    pub const fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Session language
    #[must_use]
    pub fn language(&self) -> Option<&str> {
        self.options.language.as_deref()
    }

    /// Current authorization credential
    ///
    /// Returns the cached credential while it is valid and asks the provider
    /// for a new one otherwise. Concurrent callers share a single refresh.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or `NotAuthorized` if it produced an
    /// empty credential.
    #[instrument(skip(self))]
    pub async fn authorization_token(&self) -> Result<SecretString, ApplicationError> {
        let mut cached = self.token.lock().await;
        let leeway_secs = self.options.refresh_leeway_secs.min(MAX_REFRESH_LEEWAY_SECS);
        let leeway = chrono::Duration::seconds(i64::try_from(leeway_secs).unwrap_or(0));

        if let Some(token) = cached.as_ref()
            && !token.is_expired_at(Utc::now(), leeway)
        {
            return Ok(token.secret().clone());
        }

        debug!("Fetching authorization token");
        let token = self.provider.fetch_token().await?;
        if token.is_empty() {
            warn!("Token provider returned an empty credential");
            return Err(ApplicationError::NotAuthorized(
                "Token provider returned an empty credential".to_string(),
            ));
        }

        let secret = token.secret().clone();
        *cached = Some(token);
        Ok(secret)
    }

    /// Drop the cached credential so the next call refreshes it
    pub async fn invalidate(&self) {
        if self.token.lock().await.take().is_some() {
            debug!("Authorization token invalidated");
        }
    }

    /// Create a geocoder, defaulting its language to the session's
    #[must_use]
    pub fn geocoder(&self, engine: Arc<dyn GeocodingEngine>, mut options: GeocoderOptions) -> Geocoder {
        if options.language.is_none() {
            options.language.clone_from(&self.options.language);
        }
        Geocoder::new(engine, options)
    }

    /// Create a search object, defaulting its language to the session's
    #[must_use]
    pub fn search(&self, engine: Arc<dyn SearchEngine>, mut options: SearchOptions) -> Search {
        if options.language.is_none() {
            options.language.clone_from(&self.options.language);
        }
        Search::new(engine, options)
    }

    /// Create a directions object, defaulting its language to the session's
    #[must_use]
    pub fn directions(
        &self,
        engine: Arc<dyn DirectionsEngine>,
        mut options: DirectionsOptions,
    ) -> Directions {
        if options.language.is_none() {
            options.language.clone_from(&self.options.language);
        }
        Directions::new(engine, options)
    }
}
