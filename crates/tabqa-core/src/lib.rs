//! Core types and traits for tabqa.
//!
//! This crate provides the error taxonomy, query/answer types, provider
//! traits, and configuration shared across the tabqa system.

/// Configuration types for routing, retries, and provider settings.
pub mod config;
/// Error types and result definitions.
pub mod error;
/// Trait definitions for generation and embedding providers.
pub mod traits;
/// Core data types for queries, answers, and tool traces.
pub mod types;

pub use config::{ChunkingConfig, IngestConfig, ProviderConfig, RouterConfig, TabqaConfig};
pub use error::{Error, Result};
pub use traits::{EmbeddingProvider, ModelProvider};
pub use types::{Answer, DocumentId, Query, QueryResponse, ToolCall, ToolTrace};
