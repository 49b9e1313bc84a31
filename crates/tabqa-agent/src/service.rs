//! Ingest-and-answer service over a session context.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tabqa_core::{
    EmbeddingProvider, ModelProvider, Query, QueryResponse, Result, TabqaConfig,
};
use tabqa_context::{EmbeddingIndex, RawTable, SessionContext, SessionState, TabularStore};
use tabqa_tools::{
    ExchangeRateTool, FilteredProjectionTool, NumericValuesTool, RetrieveDocumentsTool,
    ToolRegistry,
};

use crate::composer::AnswerComposer;
use crate::router::QueryRouter;

/// Front door of the core: ingests parsed tables into the session and
/// answers natural-language questions against the current snapshot.
pub struct QueryService {
    session: SessionContext,
    planner: Arc<dyn ModelProvider>,
    generator: Arc<dyn ModelProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    config: TabqaConfig,
    /// Shared HTTP client for auxiliary tools, carrying the configured
    /// timeout.
    http: Client,
}

impl QueryService {
    /// Wires a service from providers and configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        config: TabqaConfig,
        planner: Arc<dyn ModelProvider>,
        generator: Arc<dyn ModelProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.provider.timeout_secs))
            .build()?;

        Ok(Self {
            session: SessionContext::new(),
            planner,
            generator,
            embedder,
            config,
            http,
        })
    }

    /// The session context, for callers that share it across services.
    #[must_use]
    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    /// Ingests a parsed table: builds the store and embedding index off-lock,
    /// then installs them as one atomic replacement.
    ///
    /// Returns the number of ingested rows.
    ///
    /// # Errors
    ///
    /// Returns `Ingest` for a bad table or `EmbeddingService` if the index
    /// cannot be built; prior session data stays installed on failure.
    pub async fn ingest(&self, table: &RawTable) -> Result<usize> {
        let store = TabularStore::ingest(table, &self.config.ingest.content_column)?;
        let index = EmbeddingIndex::build(
            store.documents(),
            self.embedder.as_ref(),
            &self.config.chunking,
            self.config.provider.embedding_retries,
        )
        .await?;

        let count = store.len();
        self.session.install(SessionState::new(store, index));
        Ok(count)
    }

    /// Answers one question against the current session snapshot.
    ///
    /// # Errors
    ///
    /// Propagates router, planning, and generation failures as typed errors;
    /// no partial answer is returned.
    pub async fn answer(&self, query: &Query) -> Result<QueryResponse> {
        tracing::info!(
            question = query.text.as_str(),
            session = query.session_id.as_deref().unwrap_or("-"),
            "query received"
        );

        // The snapshot pins one store+index version for the whole request.
        let state = self.session.load();
        let registry = self.build_registry(&state);

        let router = QueryRouter::new(Arc::clone(&self.planner), self.config.router.clone());
        let outcome = router.run(query, &registry).await?;

        let composer = AnswerComposer::new(
            Arc::clone(&self.generator),
            self.config.provider.generation_retries,
        );
        let answer_text = composer.compose(query, &outcome.observations).await?;

        Ok(QueryResponse {
            answer_text,
            tool_trace: outcome.trace,
        })
    }

    /// Assembles the per-request tool registry over a session snapshot.
    fn build_registry(&self, state: &Arc<SessionState>) -> ToolRegistry {
        let mut registry = ToolRegistry::new()
            .with_tool(Arc::new(RetrieveDocumentsTool::new(
                Arc::clone(state),
                Arc::clone(&self.embedder),
                self.config.router.default_top_k,
            )))
            .with_tool(Arc::new(NumericValuesTool::new(Arc::clone(state))))
            .with_tool(Arc::new(FilteredProjectionTool::new(Arc::clone(state))));

        // Currency conversion only when the deployment configured the API.
        if let Some(url) = &self.config.provider.currency_api_url {
            registry = registry.with_tool(Arc::new(ExchangeRateTool::new(
                self.http.clone(),
                url.clone(),
            )));
        }

        registry
    }
}
