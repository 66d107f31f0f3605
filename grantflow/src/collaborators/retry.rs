//! Transient-failure retry with exponential backoff.
//!
//! External model calls occasionally fail with retryable markers (rate
//! limits, temporary server errors). Those retry up to a fixed attempt
//! ceiling; exhaustion or a permanent failure surfaces as a fatal
//! collaborator error for the stage.

use crate::errors::{CollaboratorError, EvalError};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Retry configuration for collaborator calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Maximum attempts, including the initial call.
    pub max_attempts: u32,
    /// Base delay between retries in milliseconds.
    pub base_delay_ms: u64,
    /// Delay cap in milliseconds.
    pub max_delay_ms: u64,
    /// Whether to apply full jitter to each delay.
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 30000,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    /// A policy with no delays, for tests.
    #[must_use]
    pub fn immediate() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 0,
            max_delay_ms: 0,
            jitter: false,
        }
    }

    /// Sets the maximum attempts.
    #[must_use]
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt))
            .min(self.max_delay_ms);
        let jittered = if self.jitter && exp > 0 {
            rand::thread_rng().gen_range(0..=exp)
        } else {
            exp
        };
        Duration::from_millis(jittered)
    }
}

/// Runs `op`, retrying transient failures per `policy`.
///
/// Non-retryable failures and retry exhaustion both map to
/// [`EvalError::Collaborator`] for the given stage.
pub async fn call_with_retries<T, F, Fut>(
    stage: &str,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T, EvalError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, CollaboratorError>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.retryable && attempt + 1 < attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    stage = %stage,
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient collaborator failure, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => return Err(EvalError::collaborator(stage, err.message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_success_first_attempt() {
        let calls = AtomicU32::new(0);
        let result = call_with_retries("score", &RetryPolicy::immediate(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, CollaboratorError>(42) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transient_failures_retried() {
        let calls = AtomicU32::new(0);
        let result = call_with_retries("score", &RetryPolicy::immediate(), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(CollaboratorError::transient("rate limited"))
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_is_fatal() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, _> = call_with_retries("critique", &RetryPolicy::immediate(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CollaboratorError::transient("still down")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(EvalError::Collaborator { stage, message }) => {
                assert_eq!(stage, "critique");
                assert_eq!(message, "still down");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_permanent_failure_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<i32, _> = call_with_retries("decide", &RetryPolicy::immediate(), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(CollaboratorError::permanent("bad input")) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_delay_capped() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 2000,
            max_delay_ms: 5000,
            jitter: false,
        };
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(5), Duration::from_millis(5000));
    }
}
