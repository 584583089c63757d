//! Bounded retry over fallible async operations.
//!
//! Expresses the retry behavior as an explicit policy value wrapping a
//! single operation: each failed attempt is logged, and exhausting the
//! bound yields a typed [`PipelineError::ExhaustedRetries`] instead of a
//! best-effort printout.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::types::PipelineError;

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

/// Runs `op` up to `policy.max_attempts` times, sleeping `policy.backoff`
/// between attempts. Returns the first success, or
/// [`PipelineError::ExhaustedRetries`] once the bound is reached.
pub async fn retry<T, F, Fut>(
    policy: RetryPolicy,
    operation: &str,
    mut op: F,
) -> Result<T, PipelineError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, PipelineError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    for attempt in 1..=max_attempts {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(
                    operation,
                    attempt,
                    max_attempts,
                    error = %err,
                    "attempt failed"
                );
            }
        }
        if attempt < max_attempts && !policy.backoff.is_zero() {
            tokio::time::sleep(policy.backoff).await;
        }
    }

    Err(PipelineError::ExhaustedRetries {
        operation: operation.to_string(),
        attempts: max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::ZERO)
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result = retry(instant_policy(3), "op", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<_, PipelineError>(42)
        })
        .await
        .unwrap();
        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = retry(instant_policy(3), "op", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(PipelineError::Index("transient".to_string()))
            } else {
                Ok("listo")
            }
        })
        .await
        .unwrap();
        assert_eq!(result, "listo");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhaustion_yields_typed_error() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry(instant_policy(3), "topic discovery", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(PipelineError::Index("down".to_string()))
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result {
            Err(PipelineError::ExhaustedRetries {
                operation,
                attempts,
            }) => {
                assert_eq!(operation, "topic discovery");
                assert_eq!(attempts, 3);
            }
            other => panic!("expected ExhaustedRetries, got {other:?}"),
        }
    }
}
