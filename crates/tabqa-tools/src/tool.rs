use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabqa_core::Result;

use crate::schema::ToolSchema;

/// Input parameters provided to a tool for execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    /// JSON object containing the tool-specific arguments.
    pub params: Value,
}

impl ToolInput {
    /// Wraps a JSON value as tool input.
    #[must_use]
    pub fn new(params: Value) -> Self {
        Self { params }
    }
}

/// Output returned by a tool after execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Human-readable summary of the result, fed to the planner as an
    /// observation.
    pub message: String,
    /// Structured result data for the composer.
    pub data: Option<Value>,
}

impl ToolOutput {
    /// Creates an output with the given summary and no data.
    pub fn message<T: Into<String>>(message: T) -> Self {
        Self {
            message: message.into(),
            data: None,
        }
    }

    /// Creates an output with the given summary and associated data.
    pub fn with_data<T: Into<String>>(message: T, data: Value) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
        }
    }
}

/// Trait for callable operations the router may invoke.
///
/// A tool is a pure function of current session state plus arguments; any
/// aggregation over returned values is the router's job.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique identifier for this tool.
    fn name(&self) -> &'static str;

    /// Returns a natural-language description of the tool's purpose, shown
    /// to the planning policy.
    fn description(&self) -> &'static str;

    /// Returns the machine-readable argument schema for this tool.
    ///
    /// The router validates every invocation against this schema before
    /// calling `execute`, so implementations may assume required arguments
    /// are present and well-typed.
    fn schema(&self) -> ToolSchema;

    /// Executes the tool with the provided input parameters.
    ///
    /// # Errors
    ///
    /// Returns `AttributeNotFound` or `InvalidArgument` for recoverable
    /// argument problems, or a provider error for upstream failures.
    async fn execute(&self, input: ToolInput) -> Result<ToolOutput>;
}
