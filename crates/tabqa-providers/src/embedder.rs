use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tabqa_core::{EmbeddingProvider, Error, Result};

use crate::openai::transient_status;

/// `OpenAI` embeddings endpoint URL.
const OPENAI_EMBEDDINGS_URL: &str = "https://api.openai.com/v1/embeddings";
/// Default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-ada-002";
/// Env var key for the `OpenAI` API key.
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// `OpenAI` embeddings provider.
pub struct OpenAiEmbedder {
    /// HTTP client for API requests.
    client: Client,
    /// API key.
    api_key: String,
    /// Embedding model name.
    model: String,
}

impl OpenAiEmbedder {
    /// Creates a new `OpenAiEmbedder` from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the `OPENAI_API_KEY` environment variable is not
    /// set.
    pub fn new() -> Result<Self> {
        let api_key = env::var(ENV_OPENAI_API_KEY)
            .map_err(|_| Error::MissingApiKey(ENV_OPENAI_API_KEY.to_owned()))?;
        Self::with_api_key_direct(api_key)
    }

    /// Creates a new `OpenAiEmbedder` with the given API key.
    ///
    /// # Errors
    ///
    /// Returns an error if the provided API key is empty.
    pub fn with_api_key_direct(api_key: String) -> Result<Self> {
        if api_key.is_empty() {
            return Err(Error::MissingApiKey(ENV_OPENAI_API_KEY.to_owned()));
        }

        Ok(Self {
            client: Client::default(),
            api_key,
            model: DEFAULT_MODEL.to_owned(),
        })
    }

    /// Sets the embedding model.
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    /// Sets the HTTP client (carrying configured timeouts).
    #[must_use]
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let request = EmbeddingsRequest {
            model: self.model.clone(),
            input,
        };

        let response = self
            .client
            .post(OPENAI_EMBEDDINGS_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(provider = self.name(), %status, "embedding request failed");
            return Err(Error::EmbeddingService {
                message: format!("provider returned status {status}"),
                transient: transient_status(status),
            });
        }

        let body: EmbeddingsResponse =
            response.json().await.map_err(|_| Error::EmbeddingService {
                message: "provider returned a malformed response".to_owned(),
                transient: false,
            })?;

        if body.data.len() != expected {
            return Err(Error::EmbeddingService {
                message: format!(
                    "provider returned {} embeddings for {expected} inputs",
                    body.data.len()
                ),
                transient: false,
            });
        }

        // The API may reorder entries; the index field restores input order.
        let mut data = body.data;
        data.sort_by_key(|entry| entry.index);
        Ok(data.into_iter().map(|entry| entry.embedding).collect())
    }
}

/// Request payload for the embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest {
    /// Embedding model identifier.
    model: String,
    /// Texts to embed.
    input: Vec<String>,
}

/// Response payload from the embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    /// One entry per input text.
    data: Vec<EmbeddingEntry>,
}

/// A single embedding with its input position.
#[derive(Debug, Deserialize)]
struct EmbeddingEntry {
    /// Position of the originating input.
    index: usize,
    /// Embedding vector.
    embedding: Vec<f32>,
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &'static str {
        "OpenAI-embeddings"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        self.request(vec![text.to_owned()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::EmbeddingService {
                message: "provider returned no embeddings".to_owned(),
                transient: false,
            })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts.to_vec()).await
    }
}
