//! Reusable retry policy for remote calls.
//!
//! Both the embedding service and the object store retry transient failures
//! through [`retry_with_backoff`]. The scoring path uses a fixed
//! inter-attempt delay; the persistence path uses exponential backoff with
//! jitter. Failure classification is supplied by the caller so each crate
//! decides what counts as transient for its own error type.

use std::future::Future;
use std::time::Duration;

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Sleep `base` before every retry.
    Fixed,
    /// Sleep `base * 2^(attempt-1)` with +/-25% jitter, capped at `cap`.
    Exponential { cap: Duration },
}

/// Retry budget for one logical operation.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure.
    pub max_retries: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    #[must_use]
    pub fn fixed(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Fixed,
        }
    }

    #[must_use]
    pub fn exponential(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            backoff: Backoff::Exponential {
                cap: Duration::from_secs(60),
            },
        }
    }

    /// Delay before the given retry attempt (1-based). Exposed so callers
    /// that manage their own attempt loops (chunked uploads) can share the
    /// schedule.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential { cap } => {
                let exp = self
                    .base_delay
                    .saturating_mul(1 << (attempt - 1).min(10))
                    .min(cap);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered = (exp.as_millis() as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                Duration::from_millis(jittered)
            }
        }
    }
}

/// Runs `operation` with up to `policy.max_retries` additional attempts.
///
/// Errors for which `is_retriable` returns `false` are returned immediately;
/// retrying a malformed response or an application-level rejection will not
/// fix it.
///
/// # Errors
///
/// Returns the last error once the retry budget is exhausted or a
/// non-retriable error occurs.
pub async fn retry_with_backoff<T, E, F, Fut, C>(
    policy: &RetryPolicy,
    is_retriable: C,
    mut operation: F,
) -> Result<T, E>
where
    E: std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    C: Fn(&E) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "transient failure, retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn zero_delay_fixed(max_retries: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_retries, Duration::ZERO)
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&zero_delay_fixed(3), |_: &String| true, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, String>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&zero_delay_fixed(3), |_: &String| true, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err("boom".to_string())
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausts_budget_and_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&zero_delay_fixed(2), |_: &String| true, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, String>("still down".to_string())
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), "still down");
        // 1 initial attempt + 2 retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retriable_errors_fail_fast() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(&zero_delay_fixed(5), |_: &String| false, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, String>("malformed".to_string())
            }
        })
        .await;
        assert_eq!(result.unwrap_err(), "malformed");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 10,
            base_delay: Duration::from_millis(1000),
            backoff: Backoff::Exponential {
                cap: Duration::from_millis(4000),
            },
        };
        // Jitter is +/-25%, so attempt 1 lands in [750, 1250] ms.
        let d1 = policy.delay_for(1).as_millis();
        assert!((750..=1250).contains(&d1), "attempt 1 delay {d1}ms");
        // Attempt 4 would be 8000ms uncapped; cap at 4000 with jitter.
        let d4 = policy.delay_for(4).as_millis();
        assert!((3000..=5000).contains(&d4), "attempt 4 delay {d4}ms");
    }

    #[test]
    fn fixed_delay_never_grows() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(5));
        assert_eq!(policy.delay_for(5), Duration::from_secs(5));
    }
}
