// file: src/generation/retry.rs
// description: bounded retry with linear backoff around generation calls
// reference: https://docs.rs/tokio/latest/tokio/time/fn.timeout.html

use crate::config::{SynthesisConfig, TransformConfig};
use crate::error::{RagError, Result};
use crate::generation::{GenerateOptions, Generator, Prompt, RawResponse};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Wait after attempt `n` is `n * base_delay`.
    pub base_delay: Duration,
    /// A timed out attempt counts as a failed attempt.
    pub call_timeout: Option<Duration>,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            call_timeout: None,
        }
    }

    pub fn single_attempt() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay * attempt
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(500))
    }
}

impl From<&SynthesisConfig> for RetryPolicy {
    fn from(config: &SynthesisConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(config.backoff_ms))
    }
}

impl From<&TransformConfig> for RetryPolicy {
    fn from(config: &TransformConfig) -> Self {
        Self::new(config.max_attempts, Duration::from_millis(500))
    }
}

pub async fn generate_with_retry<G: Generator + ?Sized>(
    generator: &G,
    prompt: &Prompt,
    options: &GenerateOptions,
    policy: &RetryPolicy,
) -> Result<RawResponse> {
    let max_attempts = policy.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let call = generator.generate(prompt, options);
        let outcome = match policy.call_timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| Err(RagError::Timeout(limit))),
            None => call.await,
        };

        match outcome {
            Ok(response) => {
                if attempt > 1 {
                    debug!("Generation succeeded on attempt {}", attempt);
                }
                return Ok(response);
            }
            Err(e) => {
                warn!(
                    "Generation call failed (attempt {}/{}): {}",
                    attempt, max_attempts, e
                );
                last_error = Some(e);
                if attempt < max_attempts {
                    tokio::time::sleep(policy.backoff(attempt)).await;
                }
            }
        }
    }

    Err(RagError::UpstreamUnavailable {
        attempts: max_attempts,
        message: last_error.map(|e| e.to_string()).unwrap_or_default(),
    })
}

/// A generator whose every call goes through a [`RetryPolicy`].
pub struct Retrying<G> {
    inner: G,
    policy: RetryPolicy,
}

impl<G: Generator> Retrying<G> {
    pub fn new(inner: G, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<G: Generator> Generator for Retrying<G> {
    async fn generate(&self, prompt: &Prompt, options: &GenerateOptions) -> Result<RawResponse> {
        generate_with_retry(&self.inner, prompt, options, &self.policy).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::FnGenerator;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn flaky(failures: u32, calls: Arc<AtomicU32>) -> impl Generator {
        FnGenerator::new(move |_, _| {
            let calls = Arc::clone(&calls);
            async move {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n <= failures {
                    Err(RagError::Upstream(format!("failure {}", n)))
                } else {
                    Ok(RawResponse::Text("ok".into()))
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_three_attempts_with_linear_backoff() {
        let calls = Arc::new(AtomicU32::new(0));
        let generator = flaky(u32::MAX, Arc::clone(&calls));
        let started = Instant::now();

        let result = generate_with_retry(
            &generator,
            &Prompt::text("q"),
            &GenerateOptions::default(),
            &RetryPolicy::default(),
        )
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(1500));
        assert!(elapsed < Duration::from_millis(1600));

        match result {
            Err(RagError::UpstreamUnavailable { attempts, message }) => {
                assert_eq!(attempts, 3);
                assert!(message.contains("failure 3"));
            }
            other => panic!("expected UpstreamUnavailable, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failure() {
        let calls = Arc::new(AtomicU32::new(0));
        let retrying = Retrying::new(flaky(1, Arc::clone(&calls)), RetryPolicy::default());

        let response = retrying
            .generate(&Prompt::text("q"), &GenerateOptions::default())
            .await
            .unwrap();
        assert_eq!(response.into_text(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let generator = FnGenerator::new(|_, _| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(RawResponse::Text("late".into()))
        });
        let policy = RetryPolicy::new(2, Duration::from_millis(500)).with_timeout(Duration::from_secs(1));

        let result =
            generate_with_retry(&generator, &Prompt::text("q"), &GenerateOptions::default(), &policy)
                .await;

        match result {
            Err(RagError::UpstreamUnavailable { attempts, message }) => {
                assert_eq!(attempts, 2);
                assert!(message.contains("timed out"));
            }
            other => panic!("expected UpstreamUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_single_attempt_policy() {
        let calls = Arc::new(AtomicU32::new(0));
        let generator = flaky(1, Arc::clone(&calls));
        let result = generate_with_retry(
            &generator,
            &Prompt::text("q"),
            &GenerateOptions::default(),
            &RetryPolicy::single_attempt(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(0, Duration::from_millis(10));
        assert_eq!(policy.max_attempts, 1);
        assert_eq!(RetryPolicy::default().backoff(2), Duration::from_millis(1000));
    }
}
