//! Filters rows by a numeric predicate and projects one attribute.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tabqa_core::{Error, Result};
use tabqa_context::{Comparator, Predicate, SessionState};

use crate::schema::{ArgumentType, ToolSchema};
use crate::tool::{Tool, ToolInput, ToolOutput};

/// Returns one attribute of every row matching a numeric comparison on
/// another attribute, in row order.
pub struct FilteredProjectionTool {
    state: Arc<SessionState>,
}

impl FilteredProjectionTool {
    /// Creates the tool over a session snapshot.
    pub fn new(state: Arc<SessionState>) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Tool for FilteredProjectionTool {
    fn name(&self) -> &'static str {
        "get_filtered_projection"
    }

    fn description(&self) -> &'static str {
        "Filters candidates by comparing a numeric column against a threshold \
         and returns another column for the matching rows. Use this for \
         questions like 'where are candidates with at least 5 years of \
         experience located'."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description())
            .required(
                "attribute",
                ArgumentType::String,
                "numeric column the comparison reads",
            )
            .required(
                "comparator",
                ArgumentType::String,
                "one of >=, >, =, <, <=",
            )
            .required("threshold", ArgumentType::Number, "comparison threshold")
            .required(
                "project",
                ArgumentType::String,
                "column returned for matching rows",
            )
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let attribute = require_str(&input.params, "attribute")?;
        let comparator: Comparator = require_str(&input.params, "comparator")?.parse()?;
        let threshold = input
            .params
            .get("threshold")
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::InvalidArgument("'threshold' must be a number".to_owned()))?;
        let project = require_str(&input.params, "project")?;

        let predicate = Predicate {
            attribute: attribute.to_owned(),
            comparator,
            threshold,
        };
        let projected = self.state.store.filter(&predicate, project)?;

        tracing::info!(
            tool = self.name(),
            attribute,
            matches = projected.len(),
            "filter done"
        );

        Ok(ToolOutput::with_data(
            format!("{} matching row(s)", projected.len()),
            json!(projected),
        ))
    }
}

fn require_str<'input>(params: &'input Value, key: &str) -> Result<&'input str> {
    params
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::InvalidArgument(format!("'{key}' must be a string")))
}
