// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded retry with exponential backoff.
//!
//! [`attempt`] runs an async operation until it succeeds, fails with an error
//! that is not worth retrying, or runs out of attempts. It knows nothing about
//! brokers; the error type decides what is transient through [`Retryable`].

use crate::domain::{PlatformError, Result};
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Errors that can tell whether a retry might help.
pub trait Retryable {
    /// Returns `true` if a later attempt may succeed.
    fn is_transient(&self) -> bool;
}

impl Retryable for PlatformError {
    fn is_transient(&self) -> bool {
        PlatformError::is_transient(self)
    }
}

/// How many times to try and how long to wait between tries.
///
/// The delay after failed attempt `n` (1-based) is
/// `base_delay * multiplier^(n - 1)`, capped at `max_delay`.
///
/// # Examples
///
/// ```
/// use packcfg::service::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 10);
/// assert_eq!(policy.delay_for(1), Duration::from_secs(1));
/// assert_eq!(policy.delay_for(2), Duration::from_secs(2));
/// assert_eq!(policy.delay_for(9), Duration::from_secs(30));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Duration,
}

impl RetryPolicy {
    /// Creates a validated policy.
    ///
    /// # Errors
    ///
    /// `InvalidSetting` if `max_attempts` is zero or `multiplier` is below 1.0
    /// or not finite.
    pub fn new(
        max_attempts: u32,
        base_delay: Duration,
        multiplier: f64,
        max_delay: Duration,
    ) -> Result<Self> {
        if max_attempts == 0 {
            return Err(PlatformError::InvalidSetting {
                key: "retry.max_attempts".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(PlatformError::InvalidSetting {
                key: "retry.multiplier".to_string(),
                message: format!("must be a finite number >= 1.0, got {}", multiplier),
            });
        }
        Ok(Self {
            max_attempts,
            base_delay,
            multiplier,
            max_delay,
        })
    }

    /// A policy that retries `max_attempts` times without waiting.
    pub fn immediate(max_attempts: u32) -> Result<Self> {
        Self::new(max_attempts, Duration::ZERO, 1.0, Duration::ZERO)
    }

    /// Maximum number of attempts, including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the first retry.
    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    /// Growth factor between consecutive delays.
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Upper bound for any single delay.
    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    /// Returns the delay to wait after failed attempt `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.base_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        let max = self.max_delay.as_secs_f64();
        if !secs.is_finite() || secs >= max {
            self.max_delay
        } else {
            Duration::from_secs_f64(secs)
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_secs(1),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Why [`attempt`] gave up.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation failed with an error that is not transient.
    #[error("{0}")]
    Aborted(#[source] E),

    /// Every attempt failed with a transient error.
    #[error("failed after {attempts} attempts: {last}")]
    Exhausted {
        /// Number of attempts made
        attempts: u32,
        /// The error from the final attempt
        #[source]
        last: E,
    },
}

impl RetryError<PlatformError> {
    /// Converts into a `PlatformError`, wrapping exhaustion as
    /// `RetriesExhausted` and passing aborts through unchanged.
    pub fn into_platform_error(self, operation: &str) -> PlatformError {
        match self {
            RetryError::Aborted(e) => e,
            RetryError::Exhausted { attempts, last } => PlatformError::RetriesExhausted {
                operation: operation.to_string(),
                attempts,
                source: Box::new(last),
            },
        }
    }
}

/// Runs `op` under `policy`.
///
/// `op` receives the 1-based attempt number. Transient failures are retried
/// after the policy's delay; failure logs escalate from `info` on the first
/// attempt to `warn` and then `error` on the last one. A non-transient failure
/// ends the loop immediately.
///
/// # Examples
///
/// ```
/// use packcfg::domain::PlatformError;
/// use packcfg::service::{attempt, RetryPolicy};
///
/// # tokio_test::block_on(async {
/// let policy = RetryPolicy::immediate(3).unwrap();
/// let result = attempt("connect", &policy, |n| async move {
///     if n < 3 {
///         Err(PlatformError::broker_unavailable("connection refused"))
///     } else {
///         Ok(n)
///     }
/// })
/// .await;
/// assert_eq!(result.unwrap(), 3);
/// # });
/// ```
pub async fn attempt<T, E, F, Fut>(
    operation: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> std::result::Result<T, RetryError<E>>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Retryable + Display,
{
    let max_attempts = policy.max_attempts();
    let mut current = 1;

    loop {
        let e = match op(current).await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !e.is_transient() {
            error!(
                operation,
                attempt = current,
                error = %e,
                "Operation failed with a non-retryable error"
            );
            return Err(RetryError::Aborted(e));
        }

        if current >= max_attempts {
            error!(
                operation,
                attempt = current,
                max_attempts,
                error = %e,
                "Operation failed after all retries"
            );
            return Err(RetryError::Exhausted {
                attempts: current,
                last: e,
            });
        }

        let delay = policy.delay_for(current);
        let delay_ms = delay.as_millis() as u64;
        if current == 1 {
            info!(
                operation,
                attempt = current,
                max_attempts,
                delay_ms,
                error = %e,
                "Operation failed, retrying"
            );
        } else {
            warn!(
                operation,
                attempt = current,
                max_attempts,
                delay_ms,
                error = %e,
                "Operation failed, retrying"
            );
        }

        tokio::time::sleep(delay).await;
        current += 1;
    }
}
