use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Stable identifier of an ingested document, unique within a session.
pub type DocumentId = Uuid;

/// A natural-language question submitted against the current session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Query {
    /// The question text.
    pub text: String,
    /// Optional conversation/session identifier supplied by the caller.
    pub session_id: Option<String>,
}

impl Query {
    /// Creates a query with no session identifier.
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: text.into(),
            session_id: None,
        }
    }

    /// Attaches a session identifier.
    #[must_use]
    pub fn with_session<T: Into<String>>(mut self, session_id: T) -> Self {
        self.session_id = Some(session_id.into());
        self
    }
}

/// A single generation produced by a model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// Generated text content.
    pub text: String,
    /// Name of the provider that produced the text.
    pub provider: String,
    /// Wall-clock latency of the provider call in milliseconds.
    pub latency_ms: u64,
}

/// One executed tool invocation, recorded for the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Name of the invoked tool.
    pub tool_name: String,
    /// Arguments the tool was invoked with.
    pub arguments: Value,
    /// Short summary of what the tool returned (or the error it raised).
    pub result_summary: String,
}

/// Ordered record of every tool invocation made while answering a query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolTrace {
    /// Calls in execution order.
    pub calls: Vec<ToolCall>,
}

impl ToolTrace {
    /// Appends a call record.
    pub fn record(&mut self, tool_name: &str, arguments: Value, result_summary: String) {
        self.calls.push(ToolCall {
            tool_name: tool_name.to_owned(),
            arguments,
            result_summary,
        });
    }

    /// Number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    /// Whether no calls were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }
}

/// Successful result of answering a query: final text plus the tool trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Final natural-language answer.
    pub answer_text: String,
    /// Every tool call made while answering.
    pub tool_trace: ToolTrace,
}
