//! HTTP client for the external vector store.
//!
//! The store owns indexing and ranking; this client only speaks its query
//! surface. Queries go out as raw text, or as a vector when an [`Embedder`]
//! is attached.

use super::{DocumentStore, Embedder, RetrievalError, RetrievedFragment};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub struct HttpVectorStore {
    client: Client,
    base_url: Url,
    collection: String,
    embedder: Option<Embedder>,
}

#[derive(Deserialize)]
struct QueryResponse {
    results: Vec<QueryHit>,
}

#[derive(Deserialize)]
struct QueryHit {
    id: String,
    text: String,
    score: f32,
}

impl HttpVectorStore {
    pub fn new(base_url: &str, collection: impl Into<String>) -> Result<Self, RetrievalError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| RetrievalError::InvalidParameters(format!("invalid store URL: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            base_url,
            collection: collection.into(),
            embedder: None,
        })
    }

    /// Query by vector instead of raw text.
    pub fn with_embedder(mut self, embedder: Embedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    fn endpoint(&self, action: &str) -> Result<Url, RetrievalError> {
        self.base_url
            .join(&format!("collections/{}/{}", self.collection, action))
            .map_err(|e| RetrievalError::InvalidParameters(e.to_string()))
    }
}

#[async_trait::async_trait]
impl DocumentStore for HttpVectorStore {
    #[instrument(skip(self, query))]
    async fn similarity_search(
        &self,
        query: &str,
        k: usize,
    ) -> Result<Vec<RetrievedFragment>, RetrievalError> {
        if k == 0 {
            return Err(RetrievalError::InvalidParameters(
                "k must be at least 1".to_string(),
            ));
        }

        let body = match &self.embedder {
            Some(embedder) => {
                let vector = embedder.embed(query).await?;
                json!({ "query_vector": vector, "n_results": k })
            }
            None => json!({ "query_text": query, "n_results": k }),
        };

        let response = self
            .client
            .post(self.endpoint("query")?)
            .json(&body)
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable(format!(
                "vector store returned {status}: {body}"
            )));
        }

        let parsed: QueryResponse = response
            .json()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let mut fragments: Vec<RetrievedFragment> = parsed
            .results
            .into_iter()
            .map(|hit| RetrievedFragment {
                text: hit.text,
                source_id: hit.id,
                score: hit.score,
            })
            .collect();
        // The contract caps results at k even if the store over-returns.
        fragments.truncate(k);
        debug!(count = fragments.len(), "retrieved fragments");
        Ok(fragments)
    }

    #[instrument(skip(self, text))]
    async fn add_document(&self, source_id: &str, text: &str) -> Result<(), RetrievalError> {
        let response = self
            .client
            .post(self.endpoint("documents")?)
            .json(&json!({ "id": source_id, "text": text }))
            .send()
            .await
            .map_err(|e| RetrievalError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RetrievalError::Unavailable(format!(
                "vector store returned {status}: {body}"
            )));
        }
        Ok(())
    }
}
