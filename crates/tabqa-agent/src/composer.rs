//! Final-answer composition from gathered tool observations.

use std::sync::Arc;
use std::time::Duration;

use tabqa_core::{Error, ModelProvider, Query, Result};
use tokio::time::sleep;

use crate::prompts::{COMPOSITION_SYSTEM, composition_prompt};
use crate::router::Observation;

/// Base delay between generation retry attempts.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// Synthesizes tool observations and the original question into a final
/// natural-language answer.
pub struct AnswerComposer {
    generator: Arc<dyn ModelProvider>,
    /// Bounded retry attempts for transient generation failures.
    retries: usize,
}

impl AnswerComposer {
    /// Creates a composer over the given generation provider.
    pub fn new(generator: Arc<dyn ModelProvider>, retries: usize) -> Self {
        Self { generator, retries }
    }

    /// Produces the final answer text.
    ///
    /// Generation calls are billed network I/O, so transient failures get a
    /// small bounded retry. Non-transient failures (malformed output, bad
    /// key) surface unchanged on the first attempt; no partial answer is
    /// ever returned.
    pub async fn compose(&self, query: &Query, observations: &[Observation]) -> Result<String> {
        let prompt = composition_prompt(&query.text, observations);

        let mut attempt = 0;
        loop {
            match self.generator.generate(COMPOSITION_SYSTEM, &prompt).await {
                Ok(answer) => {
                    tracing::info!(
                        provider = answer.provider.as_str(),
                        latency_ms = answer.latency_ms,
                        "answer composed"
                    );
                    return Ok(answer.text);
                }
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) if attempt < self.retries => {
                    tracing::warn!(attempt, "generation failed, retrying: {err}");
                    attempt += 1;
                    sleep(RETRY_BASE_DELAY * attempt as u32).await;
                }
                Err(_) => {
                    return Err(Error::Generation {
                        message: format!(
                            "{} provider failed after {} attempt(s)",
                            self.generator.name(),
                            attempt + 1
                        ),
                        transient: false,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabqa_core::Answer;

    /// Generator that fails a set number of times before succeeding.
    struct FlakyGenerator {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FlakyGenerator {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                failures_left: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for FlakyGenerator {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _system: &str, _user: &str) -> Result<Answer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
            {
                Err(Error::Generation {
                    message: "overloaded".to_owned(),
                    transient: true,
                })
            } else {
                Ok(Answer {
                    text: "final answer".to_owned(),
                    provider: "flaky".to_owned(),
                    latency_ms: 0,
                })
            }
        }
    }

    #[tokio::test]
    async fn test_compose_retries_then_succeeds() {
        let generator = FlakyGenerator::new(1);
        let composer = AnswerComposer::new(Arc::clone(&generator) as Arc<dyn ModelProvider>, 2);

        let text = composer
            .compose(&Query::new("q"), &[])
            .await
            .unwrap();
        assert_eq!(text, "final answer");
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_compose_surfaces_exhausted_retries() {
        let generator = FlakyGenerator::new(10);
        let composer = AnswerComposer::new(Arc::clone(&generator) as Arc<dyn ModelProvider>, 2);

        let error = composer.compose(&Query::new("q"), &[]).await.unwrap_err();
        assert!(matches!(error, Error::Generation { .. }));
        // Initial attempt plus two retries.
        assert_eq!(generator.calls.load(Ordering::SeqCst), 3);
    }

    /// Generator whose every reply is malformed, the way a real provider
    /// fails on an unexpected response body.
    struct MalformedGenerator {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ModelProvider for MalformedGenerator {
        fn name(&self) -> &'static str {
            "malformed"
        }

        async fn is_available(&self) -> bool {
            true
        }

        async fn generate(&self, _system: &str, _user: &str) -> Result<Answer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::Generation {
                message: "provider returned a malformed response".to_owned(),
                transient: false,
            })
        }
    }

    #[tokio::test]
    async fn test_compose_does_not_retry_malformed_output() {
        let generator = Arc::new(MalformedGenerator {
            calls: AtomicUsize::new(0),
        });
        let composer = AnswerComposer::new(Arc::clone(&generator) as Arc<dyn ModelProvider>, 2);

        let error = composer.compose(&Query::new("q"), &[]).await.unwrap_err();

        // Surfaced unchanged on the first attempt, never retried.
        assert!(error.to_string().contains("malformed response"));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    }
}
