//! Bounded retry with exponential backoff.
//!
//! Attempt `n` (zero-based) that fails and is not the last one is followed
//! by a sleep of `delay_unit * delay_base^n`. With the defaults (3 attempts,
//! base 2, one second) that is 1s then 2s before the final attempt.

use std::future::Future;
use std::time::Duration;

use modelgate_types::llm::LlmError;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_DELAY_BASE: u32 = 2;

/// Retry configuration for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Zero is treated as one.
    pub max_attempts: u32,
    pub delay_base: u32,
    pub delay_unit: Duration,
    retryable: fn(&LlmError) -> bool,
}

fn always(_: &LlmError) -> bool {
    true
}

impl RetryPolicy {
    /// Retry every failure.
    pub fn new(max_attempts: u32, delay_base: u32) -> Self {
        Self {
            max_attempts,
            delay_base,
            delay_unit: Duration::from_secs(1),
            retryable: always,
        }
    }

    /// Retry only network/HTTP-layer failures ([`LlmError::is_transient`]).
    pub fn transient(max_attempts: u32, delay_base: u32) -> Self {
        Self::new(max_attempts, delay_base).with_retryable(LlmError::is_transient)
    }

    pub fn with_unit(mut self, delay_unit: Duration) -> Self {
        self.delay_unit = delay_unit;
        self
    }

    pub fn with_retryable(mut self, retryable: fn(&LlmError) -> bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Sleep after failed attempt `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.delay_base.checked_pow(attempt).unwrap_or(u32::MAX);
        self.delay_unit.saturating_mul(factor)
    }

    pub fn should_retry(&self, error: &LlmError) -> bool {
        (self.retryable)(error)
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::transient(DEFAULT_MAX_ATTEMPTS, DEFAULT_DELAY_BASE)
    }
}

/// Run `call` until it succeeds or the policy gives up.
///
/// Every failed attempt is logged at warn level with its attempt number.
/// The last failure (or the first non-retryable one) is returned unchanged.
/// Dropping the returned future cancels any pending sleep or attempt.
pub async fn run_with_retry<T, F, Fut>(policy: &RetryPolicy, mut call: F) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let attempts = policy.attempts();
    let mut attempt = 0;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                tracing::warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    error = %err,
                    "Attempt failed"
                );

                if attempt + 1 >= attempts || !policy.should_retry(&err) {
                    return Err(err);
                }

                let delay = policy.delay_for(attempt);
                tracing::info!(delay_ms = delay.as_millis() as u64, "Retrying in {:?}", delay);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
