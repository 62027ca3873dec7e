//! Logging initialisation
//!
//! Installs a `tracing` subscriber with an `EnvFilter` and a text or JSON
//! formatting layer.

mod subscriber;

pub use subscriber::{LogFormat, TelemetryConfig, TelemetryError, init_telemetry};
