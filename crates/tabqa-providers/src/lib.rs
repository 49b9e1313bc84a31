//! Provider adapters for external generation and embedding services.

/// `OpenAI` embeddings provider implementation.
pub mod embedder;
/// Mock providers for deterministic tests.
pub mod mock;
/// `OpenAI` chat-completions provider implementation.
pub mod openai;

pub use embedder::OpenAiEmbedder;
pub use mock::{MockEmbedder, MockProvider};
pub use openai::OpenAiProvider;
