// Retry policy for image backend calls.
//
// Only transport failures (connection refused, timeouts, send errors) are retried.
// An HTTP response of any status is a real answer from the backend and is
// returned as-is.

use super::image_service::ImageError;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub attempts: u32,
    pub min_wait: Duration,
    pub max_wait: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            min_wait: Duration::from_secs(3),
            max_wait: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `retry` (1-based), given `jitter` in `[0, 1)`.
    ///
    /// The ceiling grows exponentially from `min_wait` and is clamped to
    /// `max_wait`; the actual wait is a random point between `min_wait` and it.
    pub fn delay(&self, retry: u32, jitter: f64) -> Duration {
        let exp = self
            .min_wait
            .saturating_mul(1u32 << retry.saturating_sub(1).min(16));
        let ceiling = exp.clamp(self.min_wait, self.max_wait.max(self.min_wait));
        let span = ceiling.saturating_sub(self.min_wait);
        self.min_wait + span.mul_f64(jitter.clamp(0.0, 1.0))
    }

    /// Runs `op` until it succeeds, fails with a non-transient error, or
    /// attempts run out. The last error is returned.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, ImageError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ImageError>>,
    {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < attempts => {
                    let wait = self.delay(attempt, rand::random::<f64>());
                    tracing::warn!(
                        backend = label,
                        attempt,
                        wait_ms = wait.as_millis() as u64,
                        "Transient image backend failure, retrying: {}",
                        err
                    );
                    tokio::time::sleep(wait).await;
                    attempt += 1;
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

    fn instant_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            min_wait: Duration::ZERO,
            max_wait: Duration::ZERO,
        }
    }

    #[test]
    fn test_delay_stays_in_window() {
        let policy = RetryPolicy::default();
        for retry in 1..6 {
            for jitter in [0.0, 0.3, 0.99, 1.0] {
                let d = policy.delay(retry, jitter);
                assert!(d >= Duration::from_secs(3), "{:?}", d);
                assert!(d <= Duration::from_secs(5), "{:?}", d);
            }
        }
        // First retry has no room to grow
        assert_eq!(policy.delay(1, 0.9), Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = instant_policy()
            .run("test", move || async move {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(ImageError::Connection("refused".to_string()))
                } else {
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = instant_policy()
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ImageError::Connection("timeout".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ImageError::Connection(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_status_errors_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = instant_policy()
            .run("test", move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Err(ImageError::InvalidParameters("bad sampler".to_string()))
            })
            .await;

        assert!(matches!(result, Err(ImageError::InvalidParameters(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
