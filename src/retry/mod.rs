//! Bounded retry with exponential backoff and full jitter.
//!
//! Requests that can be repeated ([`Delivery::AtLeastOnce`]) are retried on
//! connection failures, timeouts, HTTP 429 and HTTP 5xx. Requests that publish
//! content ([`Delivery::AtMostOnce`]) are retried only when the provider cannot
//! have acted on them: a failed connect or HTTP 429.

use std::thread;
use std::time::Duration;

use log::warn;
use rand::Rng;

use crate::config::DEFAULT_MAX_RETRIES;
use crate::provider::UploadError;

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Retries without sleeping in between.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `attempt + 1`: `base * 2^attempt`, capped, with full jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let cap_ms = self.max_delay.as_millis() as u64;
        let exp_ms = base_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(cap_ms);
        if exp_ms == 0 {
            return Duration::ZERO;
        }
        let jittered = rand::thread_rng().gen_range(0..=exp_ms);
        Duration::from_millis(jittered.max(base_ms.min(exp_ms)))
    }
}

/// Whether repeating a request can duplicate its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Repeating is harmless (chunk PUTs, raw uploads, draft containers).
    AtLeastOnce,
    /// Repeating could publish the same post twice.
    AtMostOnce,
}

impl Delivery {
    fn should_retry(self, e: &UploadError) -> bool {
        match self {
            Delivery::AtLeastOnce => e.is_retryable(),
            Delivery::AtMostOnce => e.is_retryable_unsent(),
        }
    }
}

/// Run a repeatable `op` until it succeeds, fails permanently, or the retry budget is spent.
///
/// `op` receives the zero-based attempt number.
pub fn with_retry<T, F>(policy: &RetryPolicy, operation: &str, op: F) -> Result<T, UploadError>
where
    F: FnMut(u32) -> Result<T, UploadError>,
{
    with_delivery(policy, Delivery::AtLeastOnce, operation, op)
}

/// Like [`with_retry`], retrying only as far as `delivery` allows.
pub fn with_delivery<T, F>(
    policy: &RetryPolicy,
    delivery: Delivery,
    operation: &str,
    mut op: F,
) -> Result<T, UploadError>
where
    F: FnMut(u32) -> Result<T, UploadError>,
{
    let mut attempt = 0;
    loop {
        match op(attempt) {
            Ok(value) => return Ok(value),
            Err(e) if delivery.should_retry(&e) && attempt < policy.max_retries => {
                let delay = policy.delay_for(attempt);
                warn!(
                    "{} failed (attempt {}), retrying in {:?}: {}",
                    operation,
                    attempt + 1,
                    delay,
                    e
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
