// Retry executor: exponential backoff with jitter over a classified
// retryable error set.

use crate::errors::RetryableError;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub jitter: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs_f64(1.0),
            max_delay: Duration::from_secs(60),
            jitter: 0.25,
        }
    }
}

impl RetryConfig {
    /// `delay = min(max_delay, base_delay * 2^(attempt-1)) * (1 + U[-jitter, +jitter])`,
    /// clamped so jitter never produces a negative delay.
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32 - 1);
        let capped = exponential.min(self.max_delay.as_secs_f64());

        let jitter_factor = if self.jitter > 0.0 {
            rand::thread_rng().gen_range(-self.jitter..=self.jitter)
        } else {
            0.0
        };
        let jittered = (capped * (1.0 + jitter_factor)).max(0.0);
        Duration::from_secs_f64(jittered)
    }
}

/// Runs `f` up to `config.max_attempts` times. Attempt 1 is immediate. On a
/// retryable failure, sleeps for the backoff delay and tries again; on a
/// non-retryable failure, aborts immediately. After exhausting attempts,
/// surfaces the last failure.
pub async fn execute<T, F, Fut>(config: &RetryConfig, mut f: F) -> Result<T, RetryableError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RetryableError>>,
{
    let mut attempt = 1;
    loop {
        match f().await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt >= config.max_attempts {
                    return Err(err);
                }
                tokio::time::sleep(config.delay_for_attempt(attempt)).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn succeeds_immediately_without_retry() {
        let config = RetryConfig::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result = execute(&config, || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, RetryableError>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_until_success() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            jitter: 0.0,
        };
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<u32, RetryableError> = execute(&config, || {
            let calls = calls_clone.clone();
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                if n < 2 {
                    Err(RetryableError::Transient("timeout".into()))
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
    async fn aborts_immediately_on_permanent_failure() {
        let config = RetryConfig::default();
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<u32, RetryableError> = execute(&config, || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RetryableError::Permanent("bad request".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn surfaces_last_failure_after_exhausting_attempts() {
        let config = RetryConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
            jitter: 0.0,
        };
        let calls = Arc::new(AtomicU32::new(0));
        let calls_clone = calls.clone();

        let result: Result<u32, RetryableError> = execute(&config, || {
            let calls = calls_clone.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(RetryableError::Transient("still failing".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn delay_never_negative_even_at_max_jitter() {
        let config = RetryConfig {
            max_attempts: 5,
            base_delay: Duration::from_secs_f64(1.0),
            max_delay: Duration::from_secs(60),
            jitter: 0.99,
        };
        for attempt in 1..=5 {
            let delay = config.delay_for_attempt(attempt);
            assert!(delay.as_secs_f64() >= 0.0);
        }
    }

    #[test]
    fn delay_is_capped_at_max_delay() {
        let config = RetryConfig {
            max_attempts: 10,
            base_delay: Duration::from_secs_f64(1.0),
            max_delay: Duration::from_secs(60),
            jitter: 0.0,
        };
        let delay = config.delay_for_attempt(8);
        assert!(delay.as_secs_f64() <= 60.0);
    }
}
