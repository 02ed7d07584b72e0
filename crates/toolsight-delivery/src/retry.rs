//! Bounded retry with capped exponential backoff.
//!
//! [`RetryPolicy`] holds the schedule and the give-up rules;
//! [`RetryExecutor`] drives any fallible async operation through it. The
//! executor keeps no state between calls: each `execute` owns its attempt
//! counter.

use std::{future::Future, sync::Arc, time::Duration};

use toolsight_core::{Clock, RealClock};

use crate::error::{DeliveryError, Result};

/// Retry policy for event delivery.
///
/// Delay before retry `i + 1` (0-indexed `i`) is `min(base_delay * 2^i,
/// max_delay)`: 100ms, 200ms, 400ms, 800ms, 1600ms, then 3000ms with the
/// defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the initial attempt.
    pub max_retries: u32,

    /// Delay before the first retry.
    pub base_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::DEFAULT_MAX_RETRIES,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(3000),
        }
    }
}

/// Outcome of consulting the policy after a failed attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Wait, then try again.
    Retry {
        /// Time to wait before the next attempt
        delay: Duration,
    },
    /// Stop and surface the error.
    GiveUp {
        /// Reason why the delivery should not be retried
        reason: String,
    },
}

impl RetryPolicy {
    /// Default schedule with a custom retry budget.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self { max_retries, ..Self::default() }
    }

    /// Total attempts this policy allows, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff before the retry following 0-indexed `attempt`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2_u32.saturating_pow(attempt);
        std::cmp::min(self.base_delay.saturating_mul(multiplier), self.max_delay)
    }

    /// Decides whether the failure of 0-indexed `attempt` is retried.
    ///
    /// Non-retryable errors end the loop regardless of the remaining budget.
    pub fn decide(&self, attempt: u32, error: &DeliveryError) -> RetryDecision {
        if !error.is_retryable() {
            return RetryDecision::GiveUp { reason: format!("non-retryable error: {error}") };
        }

        if attempt >= self.max_retries {
            return RetryDecision::GiveUp {
                reason: format!("retries exhausted after {} attempts", attempt.saturating_add(1)),
            };
        }

        RetryDecision::Retry { delay: self.delay_for_attempt(attempt) }
    }
}

/// Runs an operation under a [`RetryPolicy`].
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    clock: Arc<dyn Clock>,
    debug: bool,
}

impl RetryExecutor {
    /// Creates an executor that sleeps on the real clock.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_clock(policy, Arc::new(RealClock::new()))
    }

    /// Creates an executor that sleeps on `clock`.
    pub fn with_clock(policy: RetryPolicy, clock: Arc<dyn Clock>) -> Self {
        Self { policy, clock, debug: false }
    }

    /// Enables per-attempt diagnostic logging.
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Runs `operation` until it succeeds, fails with a non-retryable error,
    /// or the retry budget is spent.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt made.
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt: u32 = 0;

        loop {
            let error = match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => error,
            };

            match self.policy.decide(attempt, &error) {
                RetryDecision::Retry { delay } => {
                    if self.debug {
                        tracing::info!(
                            attempt,
                            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                            kind = %error.kind(),
                            error = %error,
                            "Retrying event delivery"
                        );
                    }
                    self.clock.sleep(delay).await;
                    attempt = attempt.saturating_add(1);
                },
                RetryDecision::GiveUp { reason } => {
                    if self.debug {
                        tracing::warn!(
                            attempt,
                            kind = %error.kind(),
                            error = %error,
                            "Giving up on event delivery: {reason}"
                        );
                    }
                    return Err(error);
                },
            }
        }
    }
}
