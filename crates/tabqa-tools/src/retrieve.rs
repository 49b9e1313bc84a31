//! Semantic retrieval over the embedding index, enriched with row metadata.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tabqa_core::{EmbeddingProvider, Error, Result};
use tabqa_context::SessionState;

use crate::schema::{ArgumentType, ToolSchema};
use crate::tool::{Tool, ToolInput, ToolOutput};

/// Performs semantic search over candidate documents and resolves every hit
/// back to its full row metadata.
pub struct RetrieveDocumentsTool {
    state: Arc<SessionState>,
    embedder: Arc<dyn EmbeddingProvider>,
    default_top_k: usize,
}

impl RetrieveDocumentsTool {
    /// Creates the tool over a session snapshot.
    pub fn new(
        state: Arc<SessionState>,
        embedder: Arc<dyn EmbeddingProvider>,
        default_top_k: usize,
    ) -> Self {
        Self {
            state,
            embedder,
            default_top_k,
        }
    }
}

#[async_trait]
impl Tool for RetrieveDocumentsTool {
    fn name(&self) -> &'static str {
        "retrieve_documents"
    }

    fn description(&self) -> &'static str {
        "Performs a semantic search over candidate documents to find information \
         about skills, experience, and location. Use this for open-ended questions \
         about specific candidates or their qualifications."
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new(self.name(), self.description())
            .required("query", ArgumentType::String, "natural-language search text")
            .optional(
                "top_k",
                ArgumentType::Integer,
                "number of candidates to return, at least 1",
            )
    }

    async fn execute(&self, input: ToolInput) -> Result<ToolOutput> {
        let query = input
            .params
            .get("query")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArgument("'query' must be a string".to_owned()))?;
        let top_k = input
            .params
            .get("top_k")
            .and_then(Value::as_u64)
            .map_or(self.default_top_k, |k| k as usize);

        let hits = self
            .state
            .index
            .query(query, top_k, self.embedder.as_ref())
            .await?;

        let enriched: Vec<Value> = hits
            .iter()
            .filter_map(|(id, score)| {
                self.state.store.get(*id).map(|doc| {
                    json!({
                        "id": doc.id,
                        "content": doc.content,
                        "metadata": doc.metadata,
                        "score": score,
                    })
                })
            })
            .collect();

        tracing::info!(tool = self.name(), hits = enriched.len(), "retrieval done");

        Ok(ToolOutput::with_data(
            format!("{} document(s) retrieved", enriched.len()),
            Value::Array(enriched),
        ))
    }
}
