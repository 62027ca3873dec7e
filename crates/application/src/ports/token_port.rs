//! Authorization token port
//!
//! The host application supplies authorization tokens through this port.
//! It is called again whenever the cached token has expired or was
//! rejected.

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use mockall::automock;
use secrecy::{ExposeSecret, SecretString};

use crate::error::ApplicationError;

/// An authorization token with an optional expiry
#[derive(Clone)]
pub struct AuthorizationToken {
    value: SecretString,
    expires_at: Option<DateTime<Utc>>,
}

impl AuthorizationToken {
    /// Create a token that never expires on its own
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            expires_at: None,
        }
    }

    /// Set the expiry
    #[must_use]
    pub const fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Secret token value
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.value
    }

    /// Expiry, if the token carries one
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Whether the token is expired at `now`, or within `leeway` of it
    ///
    /// A leeway reaching past the earliest representable time counts as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: chrono::Duration) -> bool {
        self.expires_at.is_some_and(|exp| {
            exp.checked_sub_signed(leeway)
                .is_none_or(|refresh_at| refresh_at <= now)
        })
    }

    /// Whether the token has any content
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().trim().is_empty()
    }
}

impl fmt::Debug for AuthorizationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationToken")
            .field("value", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Port through which the host application supplies authorization tokens
#[cfg_attr(test, automock)]
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Produce a fresh authorization token
    async fn fetch_token(&self) -> Result<AuthorizationToken, ApplicationError>;
}
