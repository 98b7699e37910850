//! Centralized retry-with-backoff for external service calls.
//!
//! Every adapter in `leadloom-clients` wraps its HTTP round trip with
//! [`retry`]. Only errors classified as transient by
//! [`LeadloomError::is_transient`] are retried; the delay doubles each
//! attempt, capped at `max_delay`.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{LeadloomError, Result};

/// Backoff policy shared by every external call site.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts including the first (so 5 = 1 call + 4 retries).
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Ceiling for the doubled delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// A policy that never sleeps, for tests that only care about counts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Run `op`, retrying transient failures per `policy`.
///
/// `what` names the call site for log lines. The last error is returned
/// once attempts are exhausted; non-transient errors return immediately.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut delay = policy.base_delay;
    let mut attempt: u32 = 1;

    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                warn!(
                    call = what,
                    attempt,
                    max_attempts = policy.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "transient failure, backing off"
                );
                tokio::time::sleep(delay).await;
                delay = (delay * 2).min(policy.max_delay);
                attempt += 1;
            }
            Err(e) => {
                if e.is_transient() {
                    return Err(LeadloomError::Network(format!(
                        "{what}: retries exhausted after {attempt} attempts: {e}"
                    )));
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    #[tokio::test]
    async fn first_success_needs_no_retry() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let out = retry(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, LeadloomError>(42) }
        })
        .await
        .unwrap();

        assert_eq!(out, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn transient_errors_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let out = retry(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(LeadloomError::Transient("HTTP 503".into()))
                } else {
                    Ok("ok")
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(out, "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_transient_errors_return_immediately() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(5);

        let err = retry(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(LeadloomError::Network("HTTP 404".into())) }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, LeadloomError::Network(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhaustion_surfaces_last_error() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::immediate(3);

        let err = retry(&policy, "hunter.domain_search", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(LeadloomError::Transient("HTTP 500".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let msg = err.to_string();
        assert!(msg.contains("retries exhausted"));
        assert!(msg.contains("hunter.domain_search"));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_doubles_and_caps() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(2),
        };

        let start = tokio::time::Instant::now();
        let _ = retry(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(LeadloomError::Transient("HTTP 502".into())) }
        })
        .await;

        // Waits: 1s, then 2s, then capped at 2s.
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
