//! Context retrieval over an external document/vector store.

pub mod embedder;
pub mod http;
pub mod memory;

use thiserror::Error;
use tracing::warn;

pub use embedder::Embedder;
pub use http::HttpVectorStore;
pub use memory::InMemoryStore;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("Document store unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid query parameters: {0}")]
    InvalidParameters(String),
}

/// One unit of retrieved text, with the identifier used for citation.
/// Created per query, never persisted.
#[derive(Debug, Clone)]
pub struct RetrievedFragment {
    pub text: String,
    pub source_id: String,
    pub score: f32,
}

/// Contract with the backing store: at most `k` fragments, ordered by
/// descending similarity, ties stable in the store's insertion order. The
/// indexing algorithm itself belongs to the store.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedFragment>, RetrievalError>;

    /// Ingest a document so later queries can cite it by `source_id`.
    async fn add_document(&self, source_id: &str, text: &str) -> Result<(), RetrievalError>;
}

/// Retrieval failure is recoverable for the chat flow: log the warning and
/// continue with an empty fragment sequence. Invalid parameters still fail.
pub async fn retrieve_or_empty(
    store: &dyn DocumentStore,
    query: &str,
    k: usize,
) -> Result<Vec<RetrievedFragment>, RetrievalError> {
    match store.similarity_search(query, k).await {
        Ok(fragments) => Ok(fragments),
        Err(RetrievalError::Unavailable(reason)) => {
            warn!(%reason, "document store unavailable, continuing without context");
            Ok(Vec::new())
        }
        Err(other) => Err(other),
    }
}
