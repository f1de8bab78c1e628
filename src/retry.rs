use crate::error::SynthesisError;
use std::future::Future;
use std::time::Duration;

/// Retry policy for a single line's synthesis. Attempts are total (the first
/// call counts as attempt one); backoff depends on the failure category and
/// on how many attempts have already been made.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl RetryPolicy {
    /// `attempt` is the 1-based index of the attempt that just failed.
    pub fn backoff(&self, error: &SynthesisError, attempt: u32) -> Duration {
        let secs = match error {
            SynthesisError::RateLimited => u64::from(attempt) * 5,
            SynthesisError::Timeout => u64::from(attempt) * 3,
            SynthesisError::ConnectionFailed(_) => u64::from(attempt) * 5,
            SynthesisError::Other { .. } => 2,
        };
        Duration::from_secs(secs)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are exhausted,
/// sleeping the category-specific backoff between attempts. Returns the last
/// error when every attempt fails.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, SynthesisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SynthesisError>>,
{
    let mut attempt: u32 = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < policy.max_attempts => {
                let wait = policy.backoff(&e, attempt);
                log::warn!(
                    "synthesis attempt {}/{} failed ({}), retrying in {}s",
                    attempt,
                    policy.max_attempts,
                    e,
                    wait.as_secs()
                );
                tokio::time::sleep(wait).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_backoff_schedule_by_category() {
        let policy = RetryPolicy::default();

        let rate = SynthesisError::RateLimited;
        assert_eq!(policy.backoff(&rate, 1), Duration::from_secs(5));
        assert_eq!(policy.backoff(&rate, 2), Duration::from_secs(10));

        let timeout = SynthesisError::Timeout;
        assert_eq!(policy.backoff(&timeout, 1), Duration::from_secs(3));
        assert_eq!(policy.backoff(&timeout, 2), Duration::from_secs(6));

        let conn = SynthesisError::ConnectionFailed("refused".to_string());
        assert_eq!(policy.backoff(&conn, 1), Duration::from_secs(5));
        assert_eq!(policy.backoff(&conn, 2), Duration::from_secs(10));

        let other = SynthesisError::Other {
            status: 500,
            body: String::new(),
        };
        assert_eq!(policy.backoff(&other, 1), Duration::from_secs(2));
        assert_eq!(policy.backoff(&other, 2), Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_exhaustion_makes_exactly_three_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = calls.clone();

        let policy = RetryPolicy::default();
        let result: Result<(), _> = retry(&policy, || {
            let calls = calls_ref.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(SynthesisError::RateLimited)
            }
        })
        .await;

        assert!(matches!(result, Err(SynthesisError::RateLimited)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_waits_five_then_ten_seconds_on_rate_limit() {
        let start = tokio::time::Instant::now();
        let policy = RetryPolicy::default();

        let result: Result<(), _> =
            retry(&policy, || async { Err(SynthesisError::RateLimited) }).await;

        assert!(result.is_err());
        // 5s after the first failure, 10s after the second.
        assert_eq!(start.elapsed(), Duration::from_secs(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_returns_first_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = calls.clone();

        let policy = RetryPolicy::default();
        let result = retry(&policy, || {
            let calls = calls_ref.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 1 {
                    Err(SynthesisError::Timeout)
                } else {
                    Ok(42u8)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
