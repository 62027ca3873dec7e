//! Retry with exponential backoff for engine calls
//!
//! Query objects never retry; the engine adapters do, driven by each error's
//! `is_retryable`. Delays grow exponentially up to a cap and carry random
//! jitter so that concurrent callers spread out.
//!
//! # Example
//!
//! ```rust,ignore
//! use infrastructure::retry::{RetryConfig, retry};
//!
//! let response = retry(&RetryConfig::default(), || client.geocode(&token, &params)).await?;
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use integration_mapkit::MapKitError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Backoff parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first retry in milliseconds
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,

    /// Upper bound for a single delay in milliseconds
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,

    /// Growth factor between consecutive delays
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Retries after the first attempt; 0 disables retrying
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Randomise each delay by up to `jitter_factor`
    #[serde(default = "default_true")]
    pub jitter_enabled: bool,

    /// Relative jitter range (0.0 to 1.0)
    #[serde(default = "default_jitter_factor")]
    pub jitter_factor: f64,
}

const fn default_initial_delay() -> u64 {
    100
}

const fn default_max_delay() -> u64 {
    5_000
}

const fn default_multiplier() -> f64 {
    2.0
}

const fn default_max_retries() -> u32 {
    2
}

const fn default_true() -> bool {
    true
}

const fn default_jitter_factor() -> f64 {
    0.1
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
            max_retries: default_max_retries(),
            jitter_enabled: default_true(),
            jitter_factor: default_jitter_factor(),
        }
    }
}

impl RetryConfig {
    /// Create a configuration with jitter enabled
    #[must_use]
    pub const fn new(
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        max_retries: u32,
    ) -> Self {
        Self {
            initial_delay_ms,
            max_delay_ms,
            multiplier,
            max_retries,
            jitter_enabled: true,
            jitter_factor: default_jitter_factor(),
        }
    }

    /// A single attempt, never retried
    #[must_use]
    pub const fn disabled() -> Self {
        Self::new(0, 0, 1.0, 0)
    }

    /// Turn jitter off
    #[must_use]
    pub const fn without_jitter(mut self) -> Self {
        self.jitter_enabled = false;
        self
    }

    /// Delay before retry number `attempt` (0-indexed)
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_wrap,
        clippy::cast_sign_loss,
        clippy::cast_possible_truncation
    )]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = (self.initial_delay_ms as f64) * self.multiplier.powi(exponent);
        let capped = base.min(self.max_delay_ms as f64);

        let delay = if self.jitter_enabled && capped > 0.0 {
            let range = capped * self.jitter_factor.clamp(0.0, 1.0);
            (capped + rand::rng().random_range(-range..=range)).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(delay as u64)
    }
}

/// Errors that know whether asking again may help
pub trait Retryable {
    /// Returns true if this error is retryable
    fn is_retryable(&self) -> bool;
}

impl Retryable for MapKitError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Outcome of a retried operation
#[derive(Debug)]
pub struct RetryResult<T, E> {
    /// Final result
    pub result: Result<T, E>,
    /// Attempts made, 1 when the first attempt decided
    pub attempts: u32,
    /// Time spent including delays
    pub total_duration: Duration,
}

impl<T, E> RetryResult<T, E> {
    /// Whether the operation eventually succeeded
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Discard the metadata
    pub fn into_result(self) -> Result<T, E> {
        self.result
    }
}

/// Run `operation` until it succeeds, fails permanently or runs out of retries
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> RetryResult<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let start = Instant::now();
    let mut attempts = 0u32;

    loop {
        attempts += 1;
        let err = match operation().await {
            Ok(value) => {
                if attempts > 1 {
                    debug!(attempts, "Operation succeeded after retries");
                }
                return RetryResult {
                    result: Ok(value),
                    attempts,
                    total_duration: start.elapsed(),
                };
            },
            Err(err) => err,
        };

        let retry_index = attempts - 1;
        if !err.is_retryable() || retry_index >= config.max_retries {
            if err.is_retryable() {
                warn!(attempts, error = %err, "Operation failed after max retries");
            } else {
                debug!(attempts, error = %err, "Operation failed with non-retryable error");
            }
            return RetryResult {
                result: Err(err),
                attempts,
                total_duration: start.elapsed(),
            };
        }

        let delay = config.delay_for_attempt(retry_index);
        warn!(
            attempt = attempts,
            max_retries = config.max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "Operation failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// [`with_retry`] without the metadata
pub async fn retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    with_retry(config, operation).await.into_result()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig::new(1, 5, 2.0, 3).without_jitter()
    }

    #[test]
    fn delays_grow_and_cap() {
        let config = RetryConfig::new(100, 300, 2.0, 5).without_jitter();
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 300);
        assert_eq!(config.delay_for_attempt(40).as_millis(), 300);
    }

    #[test]
    fn jitter_stays_in_range() {
        let config = RetryConfig::new(1000, 10_000, 2.0, 3);
        for _ in 0..50 {
            let ms = config.delay_for_attempt(0).as_millis();
            assert!((900..=1100).contains(&ms), "{ms}");
        }
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: RetryConfig = serde_json::from_str(r#"{"max_retries": 5}"#).unwrap();
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.initial_delay_ms, 100);
        assert!(config.jitter_enabled);
    }

    proptest::proptest! {
        #[test]
        fn delay_never_exceeds_cap_plus_jitter(
            initial in 0u64..2_000,
            max in 0u64..10_000,
            multiplier in 1.0f64..4.0,
            attempt in 0u32..64,
        ) {
            let config = RetryConfig::new(initial, max, multiplier, 3);
            let ms = config.delay_for_attempt(attempt).as_millis();
            let bound = u128::from(max) + u128::from(max) / 10 + 1;
            proptest::prop_assert!(ms <= bound, "{ms} > {bound}");
        }

        #[test]
        fn delays_without_jitter_are_monotonic(
            initial in 1u64..1_000,
            multiplier in 1.0f64..3.0,
            attempt in 0u32..20,
        ) {
            let config = RetryConfig::new(initial, 60_000, multiplier, 3).without_jitter();
            proptest::prop_assert!(
                config.delay_for_attempt(attempt) <= config.delay_for_attempt(attempt + 1)
            );
        }
    }

    #[tokio::test]
    async fn retries_transient_map_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let outcome = with_retry(&fast(), || {
            let counter = Arc::clone(&counter);
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(MapKitError::ServiceUnavailable("HTTP 503".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await;

        assert!(outcome.is_ok());
        assert_eq!(outcome.attempts, 3);
    }

    #[tokio::test]
    async fn permanent_errors_stop_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result: Result<(), _> = retry(&fast(), || {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(MapKitError::Unauthorized("HTTP 401".into())) }
        })
        .await;

        assert!(matches!(result, Err(MapKitError::Unauthorized(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let outcome: RetryResult<(), _> = with_retry(&fast(), || async {
            Err(MapKitError::Timeout { timeout_secs: 1 })
        })
        .await;

        assert!(!outcome.is_ok());
        assert_eq!(outcome.attempts, 4);
    }

    #[tokio::test]
    async fn disabled_makes_one_attempt() {
        let outcome: RetryResult<(), _> = with_retry(&RetryConfig::disabled(), || async {
            Err(MapKitError::RateLimitExceeded { retry_after_secs: None })
        })
        .await;
        assert_eq!(outcome.attempts, 1);
    }
}
