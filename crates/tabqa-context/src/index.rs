//! Embedding index: vectors with document back-references and
//! cosine-similarity nearest-neighbor queries.

use std::time::Duration;

use tabqa_core::config::ChunkingConfig;
use tabqa_core::{DocumentId, EmbeddingProvider, Error, Result};
use tokio::time::sleep;

use crate::chunking::chunk_text;
use crate::store::Document;

/// Base delay between embedding retry attempts.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

/// One embedded chunk with a back-reference to its document.
#[derive(Debug, Clone)]
struct IndexEntry {
    /// Owning document.
    document_id: DocumentId,
    /// Embedding vector of one content chunk.
    embedding: Vec<f32>,
}

/// In-memory nearest-neighbor index over document embeddings.
///
/// Entries are kept in ingest order; queries are stable, so equal scores
/// resolve to the earlier-ingested document.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingIndex {
    entries: Vec<IndexEntry>,
    /// Bounded retry attempts for transient provider failures.
    retries: usize,
}

impl EmbeddingIndex {
    /// Creates an empty index (before any ingest).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embeds every document's content (chunked above the configured limit)
    /// and builds a fresh index.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmbeddingService` if the provider keeps failing after
    /// the bounded retry budget.
    pub async fn build(
        documents: &[Document],
        embedder: &dyn EmbeddingProvider,
        chunking: &ChunkingConfig,
        retries: usize,
    ) -> Result<Self> {
        let mut owners = Vec::new();
        let mut texts = Vec::new();
        for doc in documents {
            for chunk in chunk_text(&doc.content, chunking.max_chars, chunking.overlap_chars) {
                owners.push(doc.id);
                texts.push(chunk);
            }
        }

        if texts.is_empty() {
            return Ok(Self {
                entries: Vec::new(),
                retries,
            });
        }

        let embeddings = embed_batch_with_retry(embedder, &texts, retries).await?;
        if embeddings.len() != texts.len() {
            return Err(Error::EmbeddingService {
                message: format!(
                    "provider returned {} embeddings for {} chunks",
                    embeddings.len(),
                    texts.len()
                ),
                transient: false,
            });
        }

        let entries = owners
            .into_iter()
            .zip(embeddings)
            .map(|(document_id, embedding)| IndexEntry {
                document_id,
                embedding,
            })
            .collect::<Vec<_>>();

        tracing::info!(chunks = entries.len(), "embedding index built");

        Ok(Self { entries, retries })
    }

    /// Number of indexed chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Embeds the query text and returns up to `top_k` documents ordered by
    /// descending similarity. A document split into several chunks counts
    /// once, scored by its best chunk. An empty index yields an empty list
    /// without calling the provider.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` if `top_k` is zero, or
    /// `Error::EmbeddingService` if the query embedding fails after retries.
    pub async fn query(
        &self,
        text: &str,
        top_k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<(DocumentId, f32)>> {
        if top_k == 0 {
            return Err(Error::InvalidArgument(
                "top_k must be at least 1".to_owned(),
            ));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query_embedding = embed_with_retry(embedder, text, self.retries).await?;

        // Best chunk score per document, first-seen order preserved.
        let mut scored: Vec<(DocumentId, f32)> = Vec::new();
        for entry in &self.entries {
            let score = cosine_similarity(&query_embedding, &entry.embedding);
            match scored.iter_mut().find(|(id, _)| *id == entry.document_id) {
                Some((_, best)) => *best = best.max(score),
                None => scored.push((entry.document_id, score)),
            }
        }

        // Stable sort keeps insertion order for tied scores.
        scored.sort_by(|first, second| {
            second
                .1
                .partial_cmp(&first.1)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(top_k);

        Ok(scored)
    }
}

/// Retries a single embedding call on transient failures with linear backoff.
async fn embed_with_retry(
    embedder: &dyn EmbeddingProvider,
    text: &str,
    retries: usize,
) -> Result<Vec<f32>> {
    let mut attempt = 0;
    loop {
        match embedder.embed(text).await {
            Ok(embedding) => return Ok(embedding),
            Err(err) => attempt = next_attempt(embedder, attempt, retries, err).await?,
        }
    }
}

/// Retries a batch embedding call on transient failures with linear backoff.
async fn embed_batch_with_retry(
    embedder: &dyn EmbeddingProvider,
    texts: &[String],
    retries: usize,
) -> Result<Vec<Vec<f32>>> {
    let mut attempt = 0;
    loop {
        match embedder.embed_batch(texts).await {
            Ok(embeddings) => return Ok(embeddings),
            Err(err) => attempt = next_attempt(embedder, attempt, retries, err).await?,
        }
    }
}

/// Shared retry accounting: sleeps and bumps the attempt counter while
/// transient budget remains, otherwise surfaces an `EmbeddingService` error.
/// Non-transient failures (malformed output, bad key) surface unchanged on
/// the first attempt.
async fn next_attempt(
    embedder: &dyn EmbeddingProvider,
    attempt: usize,
    retries: usize,
    err: Error,
) -> Result<usize> {
    if !err.is_retryable() {
        return Err(err);
    }
    if attempt >= retries {
        return Err(Error::EmbeddingService {
            message: format!(
                "{} provider failed after {} attempt(s)",
                embedder.name(),
                attempt + 1
            ),
            transient: false,
        });
    }

    tracing::warn!(
        provider = embedder.name(),
        attempt = attempt + 1,
        "embedding call failed, retrying: {err}"
    );
    sleep(RETRY_BASE_DELAY * (attempt as u32 + 1)).await;
    Ok(attempt + 1)
}

/// Cosine similarity between two vectors; 0.0 on mismatched or zero vectors.
fn cosine_similarity(vector_a: &[f32], vector_b: &[f32]) -> f32 {
    if vector_a.len() != vector_b.len() {
        return 0.0;
    }

    let dot_product: f32 = vector_a
        .iter()
        .zip(vector_b.iter())
        .map(|(x, y)| x * y)
        .sum();
    let magnitude_a = vector_a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let magnitude_b = vector_b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if magnitude_a == 0.0 || magnitude_b == 0.0 {
        return 0.0;
    }

    dot_product / (magnitude_a * magnitude_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    /// Deterministic embedder: maps known words to fixed unit vectors.
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingProvider for KeywordEmbedder {
        fn name(&self) -> &'static str {
            "keyword"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vector = vec![0.0_f32; 3];
            if text.contains("python") {
                vector[0] = 1.0;
            }
            if text.contains("rust") {
                vector[1] = 1.0;
            }
            if text.contains("java") {
                vector[2] = 1.0;
            }
            Ok(vector)
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    /// Embedder that fails a set number of times before succeeding.
    struct FlakyEmbedder {
        failures_left: AtomicUsize,
        calls: AtomicUsize,
    }

    impl FlakyEmbedder {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FlakyEmbedder {
        fn name(&self) -> &'static str {
            "flaky"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| {
                    left.checked_sub(1)
                })
                .is_ok()
            {
                Err(Error::EmbeddingService {
                    message: "overloaded".to_owned(),
                    transient: true,
                })
            } else {
                Ok(vec![1.0, 0.0])
            }
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    fn doc(content: &str) -> Document {
        Document {
            id: Uuid::new_v4(),
            content: content.to_owned(),
            metadata: BTreeMap::new(),
        }
    }

    fn default_chunking() -> ChunkingConfig {
        ChunkingConfig::default()
    }

    #[tokio::test]
    async fn test_query_orders_by_descending_score() {
        let docs = vec![doc("java expert"), doc("python and rust"), doc("python only")];
        let index = EmbeddingIndex::build(&docs, &KeywordEmbedder, &default_chunking(), 0)
            .await
            .unwrap();

        let hits = index.query("python", 3, &KeywordEmbedder).await.unwrap();
        assert_eq!(hits.len(), 3);
        // "python only" matches exactly; the mixed doc scores lower.
        assert_eq!(hits[0].0, docs[2].id);
        for window in hits.windows(2) {
            assert!(window[0].1 >= window[1].1);
        }
    }

    #[tokio::test]
    async fn test_query_respects_top_k() {
        let docs = vec![doc("python"), doc("python"), doc("python")];
        let index = EmbeddingIndex::build(&docs, &KeywordEmbedder, &default_chunking(), 0)
            .await
            .unwrap();

        let hits = index.query("python", 2, &KeywordEmbedder).await.unwrap();
        assert_eq!(hits.len(), 2);
        // Tied scores keep insertion order.
        assert_eq!(hits[0].0, docs[0].id);
        assert_eq!(hits[1].0, docs[1].id);
    }

    #[tokio::test]
    async fn test_query_empty_index_returns_empty() {
        let index = EmbeddingIndex::empty();
        let hits = index.query("anything", 3, &KeywordEmbedder).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_query_zero_top_k_is_invalid() {
        let index = EmbeddingIndex::empty();
        let error = index.query("anything", 0, &KeywordEmbedder).await.unwrap_err();
        assert!(matches!(error, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn test_chunked_document_counts_once() {
        let long_content = "rust ".repeat(600);
        let docs = vec![doc(&long_content), doc("python")];
        let index = EmbeddingIndex::build(&docs, &KeywordEmbedder, &default_chunking(), 0)
            .await
            .unwrap();
        assert!(index.len() > 2, "long content should produce several chunks");

        let hits = index.query("rust", 5, &KeywordEmbedder).await.unwrap();
        assert_eq!(hits.len(), 2, "chunks deduplicate to one hit per document");
        assert_eq!(hits[0].0, docs[0].id);
    }

    #[tokio::test]
    async fn test_build_retries_transient_failures() {
        let embedder = FlakyEmbedder::new(1);
        let docs = vec![doc("hello")];
        let index = EmbeddingIndex::build(&docs, &embedder, &default_chunking(), 2)
            .await
            .unwrap();
        assert_eq!(index.len(), 1);
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_build_surfaces_exhausted_retries() {
        let embedder = FlakyEmbedder::new(10);
        let docs = vec![doc("hello")];
        let error = EmbeddingIndex::build(&docs, &embedder, &default_chunking(), 1)
            .await
            .unwrap_err();
        assert!(matches!(error, Error::EmbeddingService { .. }));
        // Initial attempt plus one retry.
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    /// Embedder whose every reply is malformed, the way a real provider
    /// fails on an unexpected response body.
    struct MalformedEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for MalformedEmbedder {
        fn name(&self) -> &'static str {
            "malformed"
        }

        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(Error::EmbeddingService {
                message: "provider returned a malformed response".to_owned(),
                transient: false,
            })
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            let mut out = Vec::with_capacity(texts.len());
            for text in texts {
                out.push(self.embed(text).await?);
            }
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_build_does_not_retry_malformed_output() {
        let embedder = MalformedEmbedder {
            calls: AtomicUsize::new(0),
        };
        let docs = vec![doc("hello")];
        let error = EmbeddingIndex::build(&docs, &embedder, &default_chunking(), 2)
            .await
            .unwrap_err();

        // Surfaced unchanged on the first attempt, never retried.
        assert!(error.to_string().contains("malformed response"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_cosine_similarity_edge_cases() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0], &[1.0, 0.0]).abs() < f32::EPSILON);
        assert!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]).abs() < f32::EPSILON);
    }
}
