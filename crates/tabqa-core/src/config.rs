//! Configuration for routing, chunking, retries, and provider settings.

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Env var key for the generation/embedding API key.
const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
/// Env var key for the exchange-rate API base URL.
const ENV_CURRENCY_API_URL: &str = "CURRENCY_API_URL";

/// Complete tabqa configuration.
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct TabqaConfig {
    /// Router bounds and defaults.
    #[serde(default)]
    pub router: RouterConfig,
    /// Ingest settings.
    #[serde(default)]
    pub ingest: IngestConfig,
    /// Content chunking limits.
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Provider endpoints, keys, and retry bounds.
    #[serde(default)]
    pub provider: ProviderConfig,
}

/// Router bounds and defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Maximum tool-invocation rounds before `RouterExhausted`.
    pub max_rounds: usize,
    /// Bounded attempts to correct malformed planner directives.
    pub max_correction_attempts: usize,
    /// Default number of retrieval hits when the planner omits `top_k`.
    pub default_top_k: usize,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_rounds: 5,
            max_correction_attempts: 2,
            default_top_k: 3,
        }
    }
}

/// Ingest settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Column whose text becomes the retrievable document content.
    pub content_column: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            content_column: "Skills".to_owned(),
        }
    }
}

/// Content chunking limits for the embedding index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub max_chars: usize,
    /// Overlap between consecutive chunks in characters.
    pub overlap_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chars: 1000,
            overlap_chars: 200,
        }
    }
}

/// Provider endpoints, keys, timeouts, and retry bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key for the generation and embedding provider.
    pub api_key: Option<String>,
    /// Base URL of the exchange-rate API (pair endpoint).
    pub currency_api_url: Option<String>,
    /// Request timeout in seconds for provider calls.
    pub timeout_secs: u64,
    /// Bounded retries for embedding calls on transient errors.
    pub embedding_retries: usize,
    /// Bounded retries for generation calls on transient errors.
    pub generation_retries: usize,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            currency_api_url: None,
            timeout_secs: 30,
            embedding_retries: 2,
            generation_retries: 2,
        }
    }
}

impl TabqaConfig {
    /// Loads configuration from a TOML file, then applies env overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|err| Error::Config(format!("cannot read {}: {err}", path.display())))?;
        let mut config: Self = toml::from_str(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Builds a configuration from defaults plus env overrides.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// API keys from the environment win over file-provided values.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var(ENV_OPENAI_API_KEY) {
            self.provider.api_key = Some(key);
        }
        if let Ok(url) = env::var(ENV_CURRENCY_API_URL) {
            self.provider.currency_api_url = Some(url);
        }
    }

    /// Returns the configured API key.
    ///
    /// # Errors
    ///
    /// Returns `MissingApiKey` if no key was configured.
    pub fn require_api_key(&self) -> Result<&str> {
        self.provider
            .api_key
            .as_deref()
            .ok_or_else(|| Error::MissingApiKey(ENV_OPENAI_API_KEY.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn test_defaults_match_recommended_bounds() {
        let config = TabqaConfig::default();
        assert_eq!(config.router.max_rounds, 5);
        assert_eq!(config.router.max_correction_attempts, 2);
        assert_eq!(config.router.default_top_k, 3);
        assert_eq!(config.chunking.max_chars, 1000);
        assert_eq!(config.chunking.overlap_chars, 200);
        assert_eq!(config.provider.generation_retries, 2);
        assert_eq!(config.provider.embedding_retries, 2);
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[router]\nmax_rounds = 8\nmax_correction_attempts = 3\ndefault_top_k = 5\n"
        )
        .unwrap();

        let config = TabqaConfig::load(file.path()).unwrap();
        assert_eq!(config.router.max_rounds, 8);
        // Sections absent from the file keep their defaults.
        assert_eq!(config.chunking.max_chars, 1000);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let error = TabqaConfig::load(Path::new("/nonexistent/tabqa.toml")).unwrap_err();
        assert!(matches!(error, Error::Config(_)));
    }

    #[test]
    fn test_require_api_key() {
        let mut config = TabqaConfig::default();
        config.provider.api_key = None;
        assert!(matches!(
            config.require_api_key(),
            Err(Error::MissingApiKey(_))
        ));

        config.provider.api_key = Some("sk-test".to_owned());
        assert_eq!(config.require_api_key().unwrap(), "sk-test");
    }
}
