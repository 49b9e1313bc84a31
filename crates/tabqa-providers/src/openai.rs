use std::env;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tabqa_core::{Answer, Error, ModelProvider, Result};

/// Statuses worth a bounded retry: provider overload or server fault, not
/// caller mistakes like 401/404.
pub(crate) fn transient_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::TOO_MANY_REQUESTS
        || status == StatusCode::REQUEST_TIMEOUT
}

/// `OpenAI` chat-completions endpoint URL.
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";
/// Default generation model.
const DEFAULT_MODEL: &str = "gpt-4o";
/// Env var key for the `OpenAI` API key.
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";

/// `OpenAI` chat-completions provider used for planning and answer
/// composition.
pub struct OpenAiProvider {
    /// HTTP client for API requests.
    client: Client,
    /// API key.
    api_key: String,
    /// Model name to use.
    model: String,
}

impl OpenAiProvider {
    /// Creates a new `OpenAiProvider` from environment variables.
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

    /// Creates a new `OpenAiProvider` with the given API key.
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

    /// Sets the model to use for generation.
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
}

/// Request payload sent to the chat-completions API.
#[derive(Debug, Serialize)]
struct ChatRequest {
    /// Model identifier.
    model: String,
    /// Messages forming the conversation context.
    messages: Vec<ChatMessage>,
    /// Sampling temperature; zero keeps tool planning deterministic.
    temperature: f32,
}

/// Message delivered to the API.
#[derive(Debug, Serialize)]
struct ChatMessage {
    /// Role of the message author (`system` or `user`).
    role: String,
    /// Textual content of the message.
    content: String,
}

/// Response payload returned by the API.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    /// List of candidate completions.
    choices: Vec<ChatChoice>,
}

/// A single completion choice.
#[derive(Debug, Deserialize)]
struct ChatChoice {
    /// Message generated for the choice.
    message: ChatResponseMessage,
}

/// Response message containing the generated text.
#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    /// Generated text content.
    content: String,
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    async fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<Answer> {
        let start = Instant::now();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_owned(),
                    content: system_prompt.to_owned(),
                },
                ChatMessage {
                    role: "user".to_owned(),
                    content: user_prompt.to_owned(),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .client
            .post(OPENAI_API_URL)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(provider = self.name(), %status, "chat completion failed");
            return Err(Error::Generation {
                message: format!("provider returned status {status}"),
                transient: transient_status(status),
            });
        }

        let chat_response: ChatResponse = response.json().await.map_err(|_| Error::Generation {
            message: "provider returned a malformed response".to_owned(),
            transient: false,
        })?;

        let latency_ms = start.elapsed().as_millis() as u64;

        let text = chat_response
            .choices
            .first()
            .map(|choice| choice.message.content.clone())
            .ok_or_else(|| Error::Generation {
                message: "provider returned no choices".to_owned(),
                transient: false,
            })?;

        Ok(Answer {
            text,
            provider: format!("OpenAI/{}", self.model),
            latency_ms,
        })
    }
}
