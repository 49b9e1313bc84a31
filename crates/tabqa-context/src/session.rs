//! Atomically swappable session state shared by concurrent queries.

use std::sync::{Arc, PoisonError, RwLock};

use crate::index::EmbeddingIndex;
use crate::store::TabularStore;

/// One upload's store and the index built over its documents.
///
/// The pair is immutable once installed, so a query can never observe a
/// store whose rows belong to a different index version.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Ingested rows and documents.
    pub store: TabularStore,
    /// Embedding index over the store's documents.
    pub index: EmbeddingIndex,
}

impl SessionState {
    /// Creates the pre-ingest state: empty store, empty index.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a state from a freshly built store and index.
    #[must_use]
    pub fn new(store: TabularStore, index: EmbeddingIndex) -> Self {
        Self { store, index }
    }
}

/// Injectable handle to the current session state.
///
/// Uploads build a complete replacement off-lock and install it with a
/// pointer swap; queries clone the `Arc` and read without holding the lock.
#[derive(Debug, Clone)]
pub struct SessionContext {
    current: Arc<RwLock<Arc<SessionState>>>,
}

impl SessionContext {
    /// Creates a context holding the empty pre-ingest state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(SessionState::empty()))),
        }
    }

    /// Snapshot of the current state. Readers keep this `Arc` for the whole
    /// request, so an upload mid-query cannot mix versions under them.
    #[must_use]
    pub fn load(&self) -> Arc<SessionState> {
        Arc::clone(
            &self
                .current
                .read()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }

    /// Installs a replacement state atomically.
    pub fn install(&self, state: SessionState) {
        let mut guard = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *guard = Arc::new(state);
        tracing::info!(rows = guard.store.len(), "session state replaced");
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RawTable;

    fn two_row_state() -> SessionState {
        let mut table = RawTable::new(vec!["Skills", "CTC"]);
        table.push_record(vec![Some("a".to_owned()), Some("1".to_owned())]);
        table.push_record(vec![Some("b".to_owned()), Some("2".to_owned())]);
        let store = TabularStore::ingest(&table, "Skills").unwrap();
        SessionState::new(store, EmbeddingIndex::empty())
    }

    #[test]
    fn test_initial_state_is_empty() {
        let context = SessionContext::new();
        let state = context.load();
        assert!(state.store.is_empty());
        assert!(state.index.is_empty());
    }

    #[test]
    fn test_install_swaps_state() {
        let context = SessionContext::new();
        context.install(two_row_state());
        assert_eq!(context.load().store.len(), 2);
    }

    #[test]
    fn test_reader_snapshot_survives_swap() {
        let context = SessionContext::new();
        context.install(two_row_state());

        let snapshot = context.load();
        context.install(SessionState::empty());

        // The in-flight reader still sees the version it started with.
        assert_eq!(snapshot.store.len(), 2);
        assert!(context.load().store.is_empty());
    }
}
