//! Session data layer for tabqa.
//!
//! Holds the in-memory tabular store, the embedding index built over its
//! documents, and the atomically swappable session state shared by queries.

/// Content chunking for over-long document text.
pub mod chunking;
/// Embedding index with nearest-neighbor queries.
pub mod index;
/// Atomically swappable session state.
pub mod session;
/// In-memory tabular store of ingested rows.
pub mod store;

pub use chunking::chunk_text;
pub use index::EmbeddingIndex;
pub use session::{SessionContext, SessionState};
pub use store::{AttributeValue, Comparator, Document, Predicate, RawTable, TabularStore};
