use async_trait::async_trait;

use crate::{Answer, Result};

/// Trait for language-model providers that generate answer text.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Checks whether this provider is currently available.
    async fn is_available(&self) -> bool;

    /// Generates a completion for the given system and user prompts.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider is unreachable, the request times
    /// out, or the response cannot be parsed.
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<Answer>;
}

/// Trait for embedding providers that convert text into vectors.
///
/// Object-safe so the index can hold `Arc<dyn EmbeddingProvider>`.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Returns the unique identifier for this provider.
    fn name(&self) -> &'static str;

    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embeds multiple texts in one batch, preserving input order.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding generation fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
