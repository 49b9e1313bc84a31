//! Fetches every value of a numeric column for the router to aggregate.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tabqa_core::{Error, Result};
use tabqa_context::SessionState;

use crate::schema::{ArgumentType, ToolSchema};
use crate::tool::{Tool, ToolInput, ToolOutput};

/// Returns all non-missing numeric values of a named attribute.
///
/// Deliberately performs no aggregation; the router computes averages, sums,
/// or maxima from the returned sequence, keeping this tool reusable across
/// aggregate types.
pub struct NumericValuesTool {
    state: Arc<SessionState>,
}

impl NumericValuesTool {
    /// Creates the tool over a session snapshot.
    pub fn new(state: Arc<SessionState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for NumericValuesTool {
    fn name(&self) -> &'static str {
        "get_all_numeric_values"
    }

    fn description(&self) -> &'static str {
        "Retrieves every value of a numeric column (for example CTC) across all \
         candidates, in row order. Use this to compute averages, totals, or \
         extremes yourself from the returned values."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description()).required(
            "attribute",
            ArgumentType::String,
            "name of the numeric column to read",
        )
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let attribute = input
            .params
            .get("attribute")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("'attribute' must be a string".to_owned()))?;

        let values = self.state.store.all_values(attribute)?;

        tracing::info!(tool = self.name(), attribute, count = values.len(), "values fetched");

        Ok(ToolOutput::with_data(
            format!("{} value(s) of '{attribute}'", values.len()),
            json!(values),
        ))
    }
}
