//! Connection retry policy with exponential backoff.
//!
//! Form submissions are not idempotent on the backend (each one sends an
//! email), so only failures to *establish* a connection are retried: in that
//! case the request provably never reached the server. Timeouts, resets and
//! every HTTP status are final.
//!
//! # Policy
//!
//! - Max retries: 0 by default (single attempt)
//! - Initial delay: 500ms
//! - Max delay: 8 seconds
//! - Jitter: down-jitter up to 25% (multiplier in [0.75, 1.0])
//!
//! # Headers
//!
//! - `X-Retry-Count`: 0 for initial, 1+ for retries
//! - `Idempotency-Key`: `intake-{uuid}`, same across all attempts

use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries (not counting initial request).
    pub max_retries: u32,
    /// Initial backoff delay before first retry.
    pub initial_delay: Duration,
    /// Maximum backoff delay.
    pub max_delay: Duration,
    /// Jitter factor for down-jitter (0.25 = up to 25% reduction).
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            jitter_factor: 0.25,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// Calculate retry delay with exponential backoff and jitter.
///
/// `backoff_step`: 0 before first retry, 1 before second, etc.
#[must_use]
pub fn calculate_retry_delay(backoff_step: u32, config: &RetryConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(backoff_step as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    let jitter = 1.0 - rand::random::<f64>() * config.jitter_factor;
    Duration::from_secs_f64(capped * jitter)
}

pub fn add_retry_headers(
    builder: RequestBuilder,
    retry_count: u32,
    idempotency_key: &str,
) -> RequestBuilder {
    builder
        .header("X-Retry-Count", retry_count.to_string())
        .header("Idempotency-Key", idempotency_key)
}

#[must_use]
pub fn generate_idempotency_key() -> String {
    format!("intake-{}", Uuid::new_v4())
}

/// Outcome of a retried send.
#[derive(Debug)]
pub enum RetryOutcome {
    /// The server answered; any status, the caller interprets it.
    Response(Response),
    /// Could not connect after exhausting retries.
    ConnectionError {
        attempts: u32,
        source: reqwest::Error,
    },
    /// Failed in a way that must not be retried (timeout, reset, body error).
    Failed(reqwest::Error),
}

/// Send a request, retrying connection failures only.
///
/// `build_request` is called once per attempt.
pub async fn send_with_retry<F>(build_request: F, config: &RetryConfig) -> RetryOutcome
where
    F: Fn() -> RequestBuilder,
{
    let idempotency_key = generate_idempotency_key();
    let mut retry_count = 0;

    loop {
        let request = add_retry_headers(build_request(), retry_count, &idempotency_key);
        match request.send().await {
            Ok(response) => return RetryOutcome::Response(response),
            Err(e) if !is_retryable_error(&e) => return RetryOutcome::Failed(e),
            Err(e) if retry_count >= config.max_retries => {
                return RetryOutcome::ConnectionError {
                    attempts: retry_count + 1,
                    source: e,
                };
            }
            Err(e) => {
                let delay = calculate_retry_delay(retry_count, config);
                tracing::debug!(
                    error = %e,
                    retry_count = retry_count + 1,
                    delay_ms = delay.as_millis(),
                    "Retrying submission after connection error"
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
            }
        }
    }
}

fn is_retryable_error(error: &reqwest::Error) -> bool {
    error.is_connect() && !error.is_timeout()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn within(delay: Duration, low_ms: u64, high_ms: u64) -> bool {
        delay >= Duration::from_millis(low_ms) && delay <= Duration::from_millis(high_ms)
    }

    #[test]
    fn single_attempt_by_default() {
        assert_eq!(RetryConfig::default().max_retries, 0);
        assert_eq!(RetryConfig::default().with_max_retries(2).max_retries, 2);
    }

    #[test]
    fn delay_doubles_per_step_with_down_jitter() {
        let config = RetryConfig::default();
        for _ in 0..50 {
            assert!(within(calculate_retry_delay(0, &config), 375, 500));
            assert!(within(calculate_retry_delay(1, &config), 750, 1000));
            assert!(within(calculate_retry_delay(2, &config), 1500, 2000));
        }
    }

    #[test]
    fn delay_never_exceeds_cap() {
        let config = RetryConfig {
            max_delay: Duration::from_secs(2),
            ..RetryConfig::default()
        };
        for step in [5, 10, 31] {
            assert!(within(calculate_retry_delay(step, &config), 1500, 2000));
        }
    }

    #[test]
    fn idempotency_keys_are_unique_uuids() {
        let key = generate_idempotency_key();
        let uuid = key.strip_prefix("intake-").expect("prefix");
        assert!(Uuid::parse_str(uuid).is_ok());
        assert_ne!(key, generate_idempotency_key());
    }
}
