//! Maps server API configuration

use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the maps server API client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapKitConfig {
    /// Base URL of the server API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Geocode cache TTL in seconds (0 to disable caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached geocode responses
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,

    /// Refresh access tokens this many seconds before they expire
    #[serde(default = "default_token_refresh_margin_secs")]
    pub token_refresh_margin_secs: u64,
}

fn default_base_url() -> String {
    "https://maps-api.apple.com".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

const fn default_cache_ttl_secs() -> u64 {
    300
}

const fn default_cache_capacity() -> u64 {
    1000
}

const fn default_token_refresh_margin_secs() -> u64 {
    60
}

impl Default for MapKitConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            token_refresh_margin_secs: default_token_refresh_margin_secs(),
        }
    }
}

impl MapKitConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            cache_ttl_secs: 0,
            ..Default::default()
        }
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_secs > 0 && self.cache_capacity > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        let url = Url::parse(&self.base_url).map_err(|e| format!("base_url is invalid: {e}"))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(format!("base_url must use http or https, got {}", url.scheme()));
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}
