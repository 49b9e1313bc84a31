//! Mock providers for testing router and composer flows.
//!
//! Allows defining canned responses for specific prompts, enabling
//! end-to-end testing of query workflows without real API calls.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash as _, Hasher as _};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tabqa_core::{Answer, EmbeddingProvider, Error, ModelProvider, Result};

/// Response storage type.
type ResponseMap = Arc<Mutex<Vec<(String, String)>>>;

/// Mock generation provider that returns pre-defined responses based on
/// prompt patterns.
///
/// Patterns are matched against the user prompt in registration order:
/// exact match first, then substring. Each canned response is consumed once
/// so a planner can be scripted round by round.
#[derive(Clone)]
pub struct MockProvider {
    /// Predefined (pattern, response) pairs in registration order.
    responses: ResponseMap,
    /// Default response if no pattern matches.
    default_response: Arc<Mutex<Option<String>>>,
    /// User prompts seen, for verification.
    call_history: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Creates a mock provider with no canned responses.
    #[must_use]
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(Vec::new())),
            default_response: Arc::new(Mutex::new(None)),
            call_history: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a pattern-based response, consumed on first match.
    #[must_use]
    pub fn with_response(self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        {
            let mut responses = self
                .responses
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            responses.push((pattern.into(), response.into()));
        }
        self
    }

    /// Sets a default response for prompts that match no pattern.
    #[must_use]
    pub fn with_default_response(self, response: impl Into<String>) -> Self {
        {
            let mut default = self
                .default_response
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            *default = Some(response.into());
        }
        self
    }

    /// Returns every user prompt this provider has seen.
    #[must_use]
    pub fn call_history(&self) -> Vec<String> {
        self.call_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of generate calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.call_history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Finds and consumes the first matching canned response.
    fn take_response(&self, user_prompt: &str) -> Option<String> {
        let mut responses = self
            .responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let position = responses
            .iter()
            .position(|(pattern, _)| pattern == user_prompt)
            .or_else(|| {
                responses
                    .iter()
                    .position(|(pattern, _)| user_prompt.contains(pattern.as_str()))
            })?;

        Some(responses.remove(position).1)
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn is_available(&self) -> bool {
        true
    }

    async fn generate(&self, _system_prompt: &str, user_prompt: &str) -> Result<Answer> {
        {
            let mut history = self
                .call_history
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            history.push(user_prompt.to_owned());
        }

        let text = self.take_response(user_prompt).or_else(|| {
            self.default_response
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        });

        text.map_or_else(
            || {
                Err(Error::Generation {
                    message: "no canned response matched".to_owned(),
                    transient: false,
                })
            },
            |text| {
                Ok(Answer {
                    text,
                    provider: "mock".to_owned(),
                    latency_ms: 0,
                })
            },
        )
    }
}

/// Deterministic hash-based embedding provider for tests.
///
/// The same text always maps to the same 384-dimension vector, so index
/// behavior is reproducible without a real embedding service.
#[derive(Clone, Default)]
pub struct MockEmbedder;

impl MockEmbedder {
    /// Dimension of produced vectors.
    pub const DIMENSION: usize = 384;

    fn hash_embedding(text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let hash = hasher.finish();

        let mut vector = Vec::with_capacity(Self::DIMENSION);
        for idx in 0..Self::DIMENSION {
            let value = ((hash.wrapping_add(idx as u64)) % 1000) as f32 / 1000.0;
            vector.push(value);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn name(&self) -> &'static str {
        "mock-embedder"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::hash_embedding(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .iter()
            .map(|text| Self::hash_embedding(text))
            .collect())
    }
}
