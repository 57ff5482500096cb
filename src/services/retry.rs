use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::WatchError;

/// Capped retry with linear backoff: attempt `n` waits `n * backoff` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn delay_before(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt.saturating_sub(1))
    }

    /// Run `op` until it succeeds or the attempts are exhausted, returning
    /// the last error.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, WatchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, WatchError>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < attempts => {
                    warn!(attempt, max_attempts = attempts, error = %err, "{} failed, retrying", what);
                    attempt += 1;
                    tokio::time::sleep(self.delay_before(attempt)).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::default();

        let result: Result<(), _> = policy
            .run("fetch", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(WatchError::fetch("down"))
            })
            .await;

        assert!(matches!(result, Err(WatchError::FetchFailed(_))));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_on_first_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let policy = RetryPolicy::default();

        let result = policy
            .run("fetch", move || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(WatchError::fetch("blip"))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn backoff_is_linear() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(2));
        assert_eq!(policy.delay_before(3), Duration::from_secs(4));
    }
}
