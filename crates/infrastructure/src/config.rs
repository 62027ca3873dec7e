//! Application configuration
//!
//! Loaded from an optional `mapframe.toml` in the working directory (or an
//! explicit file), overridden by `MAPFRAME_*` environment variables where a
//! double underscore separates sections, e.g. `MAPFRAME_MAPKIT__LANGUAGE`.

use std::fmt;
use std::path::Path;

use application::{DEFAULT_HISTORY_LIMIT, MAX_REFRESH_LEEWAY_SECS, SessionOptions};
use integration_mapkit::MapKitConfig;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;
use crate::telemetry::{LogFormat, TelemetryConfig};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "MAPFRAME";

/// Default configuration file name, without extension
pub const DEFAULT_CONFIG_FILE: &str = "mapframe";

/// Application environment (development or production)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment
    #[default]
    Development,
    /// Production environment
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment
    #[serde(default)]
    pub environment: Environment,

    /// Maps service configuration
    #[serde(default)]
    pub mapkit: MapKitAppConfig,

    /// Retry behaviour of engine calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Request bookkeeping of the query objects
    #[serde(default)]
    pub requests: RequestsConfig,

    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Maps service section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapKitAppConfig {
    /// Authorization token (JWT) handed to the token exchange
    ///
    /// Prefer `MAPFRAME_MAPKIT__AUTH_TOKEN` over writing it to a file.
    #[serde(default, skip_serializing)]
    pub auth_token: Option<SecretString>,

    /// Default result language (BCP 47)
    #[serde(default)]
    pub language: Option<String>,

    /// Refresh the authorization token this many seconds before it expires
    #[serde(default = "default_refresh_leeway_secs")]
    pub refresh_leeway_secs: u64,

    /// Server API client settings
    #[serde(flatten)]
    pub client: MapKitConfig,
}

const fn default_refresh_leeway_secs() -> u64 {
    30
}

impl Default for MapKitAppConfig {
    fn default() -> Self {
        Self {
            auth_token: None,
            language: None,
            refresh_leeway_secs: default_refresh_leeway_secs(),
            client: MapKitConfig::default(),
        }
    }
}

impl MapKitAppConfig {
    /// Options for the mapping session
    #[must_use]
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            language: self.language.clone(),
            refresh_leeway_secs: self.refresh_leeway_secs,
        }
    }
}

/// Request bookkeeping section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestsConfig {
    /// Finished requests whose state stays inspectable, per query object
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

const fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl Default for RequestsConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
        }
    }
}

impl AppConfig {
    /// Load from `mapframe.toml` (if present) and the environment
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name(DEFAULT_CONFIG_FILE).required(false))
    }

    /// Load from an explicit file and the environment
    pub fn load_from(path: &Path) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path).required(true))
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app: Self = config.try_deserialize()?;
        app.validate().map_err(config::ConfigError::Message)?;
        Ok(app)
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid setting.
    pub fn validate(&self) -> Result<(), String> {
        self.mapkit
            .client
            .validate()
            .map_err(|e| format!("mapkit: {e}"))?;
        if self.mapkit.refresh_leeway_secs > MAX_REFRESH_LEEWAY_SECS {
            return Err(format!(
                "mapkit.refresh_leeway_secs must not exceed {MAX_REFRESH_LEEWAY_SECS}"
            ));
        }

        if !(0.0..=1.0).contains(&self.retry.jitter_factor) {
            return Err("retry.jitter_factor must be between 0.0 and 1.0".to_string());
        }
        if self.retry.multiplier < 1.0 {
            return Err("retry.multiplier must be at least 1.0".to_string());
        }

        if self.environment == Environment::Production
            && self.telemetry.log_format != LogFormat::Json
        {
            tracing::warn!("Text logs in production; consider telemetry.log_format = \"json\"");
        }
        Ok(())
    }
}
