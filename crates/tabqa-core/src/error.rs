use core::result::Result as CoreResult;

use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;
use toml::de::Error as TomlError;

/// Result type for tabqa operations.
pub type Result<T> = CoreResult<T, Error>;

/// Errors that can occur across the tabqa system.
#[derive(Debug, Error)]
pub enum Error {
    /// The uploaded table was empty or missing its content column.
    #[error("Ingest failed: {0}")]
    Ingest(String),

    /// A referenced attribute was never ingested.
    #[error("Attribute not found: {0}")]
    AttributeNotFound(String),

    /// Tool or index arguments were malformed.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The embedding provider failed.
    #[error("Embedding service failed: {message}")]
    EmbeddingService {
        /// What the provider reported.
        message: String,
        /// Whether the failure looked transient (overload, 5xx, timeout).
        transient: bool,
    },

    /// The generation provider failed.
    #[error("Generation failed: {message}")]
    Generation {
        /// What the provider reported.
        message: String,
        /// Whether the failure looked transient (overload, 5xx, timeout).
        transient: bool,
    },

    /// The exchange-rate service failed or returned a malformed response.
    #[error("Exchange-rate service failed: {0}")]
    ExchangeService(String),

    /// The router did not reach a final answer within its round cap.
    #[error("Router exhausted after {rounds} tool rounds without an answer")]
    RouterExhausted {
        /// Number of rounds executed before giving up.
        rounds: usize,
    },

    /// The planning policy could not produce valid tool arguments.
    #[error("Planning failed: {0}")]
    Planning(String),

    /// An HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] ReqwestError),

    /// JSON serialization or deserialization failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] SerdeJsonError),

    /// TOML deserialization failed.
    #[error("TOML deserialization error: {0}")]
    Toml(#[from] TomlError),

    /// Configuration is invalid or missing.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Required API key was not found.
    #[error("API key not found: {0}")]
    MissingApiKey(String),
}

impl Error {
    /// Stable machine-readable tag for this error kind.
    ///
    /// Returned to callers alongside the human-readable message so the
    /// embedding application can branch without parsing display text.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Ingest(_) => "ingest_error",
            Self::AttributeNotFound(_) => "attribute_not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::EmbeddingService { .. } => "embedding_service_error",
            Self::Generation { .. } => "generation_error",
            Self::ExchangeService(_) => "exchange_service_error",
            Self::RouterExhausted { .. } => "router_exhausted",
            Self::Planning(_) => "planning_error",
            Self::Request(_) => "request_error",
            Self::Json(_) => "json_error",
            Self::Toml(_) => "toml_error",
            Self::Config(_) => "config_error",
            Self::MissingApiKey(_) => "missing_api_key",
        }
    }

    /// Determines whether this error may succeed if retried.
    ///
    /// Only transient failures qualify: network timeouts and connection
    /// drops, plus provider errors flagged transient (overload, 5xx).
    /// Malformed provider output and misconfiguration never qualify.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(err) => err.is_timeout() || err.is_connect(),
            Self::EmbeddingService { transient, .. } | Self::Generation { transient, .. } => {
                *transient
            }
            _ => false,
        }
    }

    /// Whether the router may recover from this error by replanning.
    ///
    /// Attribute and argument errors are fed back to the planner as
    /// observations; everything else propagates to the caller.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::AttributeNotFound(_) | Self::InvalidArgument(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value as JsonValue, from_str};

    #[test]
    fn test_error_display() {
        let error1 = Error::Ingest("content column 'Skills' missing".to_owned());
        assert_eq!(
            error1.to_string(),
            "Ingest failed: content column 'Skills' missing"
        );

        let error2 = Error::AttributeNotFound("salary".to_owned());
        assert_eq!(error2.to_string(), "Attribute not found: salary");

        let error3 = Error::RouterExhausted { rounds: 5 };
        assert_eq!(
            error3.to_string(),
            "Router exhausted after 5 tool rounds without an answer"
        );
    }

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(Error::Ingest(String::new()).kind(), "ingest_error");
        assert_eq!(
            Error::AttributeNotFound(String::new()).kind(),
            "attribute_not_found"
        );
        assert_eq!(
            Error::RouterExhausted { rounds: 0 }.kind(),
            "router_exhausted"
        );
        assert_eq!(Error::Planning(String::new()).kind(), "planning_error");
        assert_eq!(
            Error::ExchangeService(String::new()).kind(),
            "exchange_service_error"
        );
    }

    #[test]
    fn test_error_is_retryable() {
        assert!(
            Error::EmbeddingService {
                message: "503".to_owned(),
                transient: true,
            }
            .is_retryable()
        );
        assert!(
            Error::Generation {
                message: "overloaded".to_owned(),
                transient: true,
            }
            .is_retryable()
        );

        // Malformed output and misconfiguration are surfaced, not retried.
        assert!(
            !Error::EmbeddingService {
                message: "provider returned a malformed response".to_owned(),
                transient: false,
            }
            .is_retryable()
        );
        assert!(
            !Error::Generation {
                message: "provider returned status 401".to_owned(),
                transient: false,
            }
            .is_retryable()
        );
        assert!(!Error::Ingest("bad table".to_owned()).is_retryable());
        assert!(!Error::AttributeNotFound("ctc".to_owned()).is_retryable());
        assert!(!Error::MissingApiKey("KEY".to_owned()).is_retryable());
        assert!(!Error::ExchangeService("502".to_owned()).is_retryable());
    }

    #[test]
    fn test_error_is_recoverable() {
        assert!(Error::AttributeNotFound("exp".to_owned()).is_recoverable());
        assert!(Error::InvalidArgument("top_k must be >= 1".to_owned()).is_recoverable());

        assert!(
            !Error::Generation {
                message: "down".to_owned(),
                transient: true,
            }
            .is_recoverable()
        );
        assert!(!Error::RouterExhausted { rounds: 5 }.is_recoverable());
    }

    #[test]
    fn test_error_from_json() {
        let json_error = from_str::<JsonValue>("invalid json").unwrap_err();
        let error: Error = json_error.into();
        assert!(matches!(error, Error::Json(_)));
        assert_eq!(error.kind(), "json_error");
    }
}
