use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use super::{GenerationError, TextGenerator};
use crate::config::RetryConfig;
use crate::GistError;

/// Bounded exponential backoff around a single model call
#[derive(Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, the first call included
    pub max_attempts: u32,

    /// Base delay, doubled for every further retry
    pub multiplier: Duration,

    /// Lower bound of every wait
    pub min_wait: Duration,

    /// Upper bound of every wait
    pub max_wait: Duration,

    /// Which failures are worth another attempt
    pub retry_if: fn(&GenerationError) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            multiplier: Duration::from_secs(2),
            min_wait: Duration::from_secs(4),
            max_wait: Duration::from_secs(60),
            retry_if: GenerationError::is_rate_limited,
        }
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("multiplier", &self.multiplier)
            .field("min_wait", &self.min_wait)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            multiplier: Duration::from_secs(config.multiplier_secs),
            min_wait: Duration::from_secs(config.min_wait_secs),
            max_wait: Duration::from_secs(config.max_wait_secs),
            ..Self::default()
        }
    }

    /// Delay after the `failed_attempt`-th failure (1-based):
    /// `multiplier * 2^(failed_attempt - 1)`, clamped to `[min_wait, max_wait]`.
    pub fn wait_after(&self, failed_attempt: u32) -> Duration {
        let exponent = failed_attempt.saturating_sub(1);
        let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
        let raw = self.multiplier.saturating_mul(factor);
        raw.min(self.max_wait).max(self.min_wait)
    }
}

/// Something that can pause the current task
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately; keeps backoff out of unit tests
#[cfg(test)]
pub(crate) struct InstantSleeper;

#[cfg(test)]
#[async_trait]
impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}

/// Call the generator, retrying only the failures `policy.retry_if` accepts.
///
/// Returns [`GistError::RetryExhausted`] when every attempt failed with a
/// retryable error; any other error is returned from the attempt that hit it.
pub async fn generate_with_retry(
    generator: &dyn TextGenerator,
    prompt: &str,
    temperature: f32,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<String, GistError> {
    let mut attempt = 1;

    loop {
        match generator.generate(prompt, temperature).await {
            Ok(text) => return Ok(text),
            Err(err) if (policy.retry_if)(&err) => {
                if attempt >= policy.max_attempts {
                    tracing::error!(attempts = attempt, error = %err, "Retry budget exhausted");
                    return Err(GistError::RetryExhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }

                let wait = policy.wait_after(attempt);
                tracing::warn!(
                    attempt,
                    wait_secs = wait.as_secs(),
                    error = %err,
                    "Model rate limited, backing off"
                );
                sleeper.sleep(wait).await;
                attempt += 1;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockTextGenerator;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingSleeper {
        waits: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.waits.lock().unwrap().push(duration);
        }
    }

    impl RecordingSleeper {
        fn waits(&self) -> Vec<Duration> {
            self.waits.lock().unwrap().clone()
        }
    }

    /// Generator that is rate limited `failures` times, then answers
    fn flaky_generator(failures: u32, expected_calls: usize) -> MockTextGenerator {
        let calls = Arc::new(AtomicU32::new(0));
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .times(expected_calls)
            .returning(move |_, _| {
                if calls.fetch_add(1, Ordering::SeqCst) < failures {
                    Err(GenerationError::RateLimited("quota".into()))
                } else {
                    Ok("summary".into())
                }
            });
        generator
    }

    #[test]
    fn test_wait_schedule() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (1..=6).map(|n| policy.wait_after(n).as_secs()).collect();
        assert_eq!(waits, vec![4, 4, 8, 16, 32, 60]);
        assert_eq!(policy.wait_after(40), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        for failures in 0..5u32 {
            let generator = flaky_generator(failures, failures as usize + 1);
            let sleeper = RecordingSleeper::default();

            let text = generate_with_retry(&generator, "p", 0.7, &RetryPolicy::default(), &sleeper)
                .await
                .unwrap();

            assert_eq!(text, "summary");
            let waits = sleeper.waits();
            assert_eq!(waits.len(), failures as usize);
            assert!(waits.windows(2).all(|w| w[0] <= w[1]));
            assert!(waits.iter().all(|w| *w <= Duration::from_secs(60)));
        }
    }

    #[tokio::test]
    async fn test_exhausts_after_max_attempts() {
        let generator = flaky_generator(u32::MAX, 5);
        let sleeper = RecordingSleeper::default();

        let err = generate_with_retry(&generator, "p", 0.7, &RetryPolicy::default(), &sleeper)
            .await
            .unwrap_err();

        assert!(matches!(err, GistError::RetryExhausted { attempts: 5, .. }));
        assert_eq!(sleeper.waits().len(), 4);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().times(1).returning(|_, _| {
            Err(GenerationError::Api {
                status: 400,
                message: "bad request".into(),
            })
        });
        let sleeper = RecordingSleeper::default();

        let err = generate_with_retry(&generator, "p", 0.7, &RetryPolicy::default(), &sleeper)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            GistError::Generation(GenerationError::Api { status: 400, .. })
        ));
        assert!(sleeper.waits().is_empty());
    }

    #[test]
    fn test_tokio_sleeper_waits() {
        tokio_test::block_on(async {
            let start = std::time::Instant::now();
            TokioSleeper.sleep(Duration::from_millis(5)).await;
            assert!(start.elapsed() >= Duration::from_millis(5));
        });
    }
}
