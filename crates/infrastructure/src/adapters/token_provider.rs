//! Token providers backed by configuration or the environment

use application::error::ApplicationError;
use application::ports::{AuthorizationToken, TokenProvider};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use std::env;
use tracing::{debug, instrument, warn};

/// Hands out one fixed authorization token
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl StaticTokenProvider {
    /// Create a provider for a token that never expires on its own
    pub fn new(token: SecretString) -> Self {
        Self {
            token,
            expires_at: None,
        }
    }

    /// Set the expiry reported with the token
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn fetch_token(&self) -> Result<AuthorizationToken, ApplicationError> {
        let token = AuthorizationToken::new(self.token.expose_secret());
        Ok(match self.expires_at {
            Some(expires_at) => token.with_expiry(expires_at),
            None => token,
        })
    }
}

/// Reads the authorization token from an environment variable on every fetch
///
/// A rotated token is picked up the next time the session refreshes.
#[derive(Debug, Clone)]
pub struct EnvTokenProvider {
    var: String,
}

impl EnvTokenProvider {
    /// Variable consulted by [`EnvTokenProvider::default`]
    pub const DEFAULT_VAR: &'static str = "MAPFRAME_AUTH_TOKEN";

    /// Read from `var`
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    /// Variable name
    pub fn var(&self) -> &str {
        &self.var
    }
}

impl Default for EnvTokenProvider {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VAR)
    }
}

#[async_trait]
impl TokenProvider for EnvTokenProvider {
    #[instrument(skip(self), fields(var = %self.var))]
    async fn fetch_token(&self) -> Result<AuthorizationToken, ApplicationError> {
        match env::var(&self.var) {
            Ok(value) => {
                debug!("Read authorization token from environment");
                Ok(AuthorizationToken::new(value))
            },
            Err(env::VarError::NotPresent) => {
                warn!("Authorization token variable not set");
                Err(ApplicationError::NotAuthorized(format!(
                    "Environment variable {} is not set",
                    self.var
                )))
            },
            Err(env::VarError::NotUnicode(_)) => Err(ApplicationError::Configuration(format!(
                "Environment variable {} contains invalid UTF-8",
                self.var
            ))),
        }
    }
}
