//! Infrastructure layer - Adapters for external systems
//!
//! Implements the ports defined in the application layer on top of the maps
//! server API, and carries configuration, retry and logging.

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod retry;
pub mod telemetry;

pub use adapters::*;
pub use bootstrap::{BootstrapError, MapServices};
pub use config::{AppConfig, Environment, MapKitAppConfig, RequestsConfig};
pub use retry::{RetryConfig, RetryResult, Retryable, retry, with_retry};
pub use telemetry::{LogFormat, TelemetryConfig, TelemetryError, init_telemetry};
