//! In-process document store with deterministic lexical scoring.
//!
//! Serves tests and offline sessions. Scoring is token overlap (Jaccard),
//! which is crude but stable: equal scores keep insertion order because the
//! sort is stable.

use super::{DocumentStore, RetrievalError, RetrievedFragment};
use std::collections::HashSet;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemoryStore {
    docs: RwLock<Vec<(String, String)>>, // (source_id, text), insertion order
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

fn tokens(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    intersection as f32 / union as f32
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryStore {
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
        let query_tokens = tokens(query);
        let docs = self.docs.read().await;

        let mut scored: Vec<RetrievedFragment> = docs
            .iter()
            .map(|(source_id, text)| RetrievedFragment {
                score: jaccard(&query_tokens, &tokens(text)),
                text: text.clone(),
                source_id: source_id.clone(),
            })
            .collect();

        // Stable sort: ties stay in insertion order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn add_document(&self, source_id: &str, text: &str) -> Result<(), RetrievalError> {
        self.docs
            .write()
            .await
            .push((source_id.to_string(), text.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded() -> InMemoryStore {
        let store = InMemoryStore::new();
        store
            .add_document("doc-1", "oauth token replay attacks on web applications")
            .await
            .unwrap();
        store
            .add_document("doc-2", "sql injection in login forms")
            .await
            .unwrap();
        store
            .add_document("doc-3", "oauth scopes and token expiry hardening")
            .await
            .unwrap();
        store
            .add_document("doc-4", "physical security of data centres")
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn never_returns_more_than_k() {
        let store = seeded().await;
        let results = store.similarity_search("oauth token", 2).await.unwrap();
        assert_eq!(results.len(), 2);
        let results = store.similarity_search("oauth token", 10).await.unwrap();
        assert_eq!(results.len(), 4);
    }

    #[tokio::test]
    async fn scores_are_non_increasing() {
        let store = seeded().await;
        let results = store.similarity_search("oauth token expiry", 4).await.unwrap();
        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(results[0].score > 0.0);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let store = InMemoryStore::new();
        store.add_document("a", "alpha beta").await.unwrap();
        store.add_document("b", "alpha beta").await.unwrap();
        let results = store.similarity_search("alpha", 2).await.unwrap();
        assert_eq!(results[0].source_id, "a");
        assert_eq!(results[1].source_id, "b");
    }

    #[tokio::test]
    async fn zero_k_is_invalid() {
        let store = seeded().await;
        assert!(matches!(
            store.similarity_search("oauth", 0).await,
            Err(RetrievalError::InvalidParameters(_))
        ));
    }
}
