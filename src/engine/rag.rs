//! Retrieval-augmented query flow: retrieve context, assemble the prompt,
//! invoke the model, return the answer with its citations.

use crate::prompt::{assemble, templates::COPILOT_TEMPLATE, MissingFieldError};
use crate::providers::{ModelProvider, ProviderError};
use crate::retrieval::{retrieve_or_empty, DocumentStore, RetrievalError};
use crate::session::{ConversationTurn, SessionContext};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Prompt(#[from] MissingFieldError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Retrieval(#[from] RetrievalError),
}

/// Generated answer plus, when context retrieval was used, the source
/// identifiers of the fragments that informed it.
#[derive(Debug, Clone)]
pub struct ModelResponse {
    pub content: String,
    pub sources: Option<Vec<String>>,
}

pub struct RagPipeline {
    provider: Arc<dyn ModelProvider>,
    store: Option<Arc<dyn DocumentStore>>,
    top_k: usize,
}

impl RagPipeline {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self {
            provider,
            store: None,
            top_k: 5,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Answer one follow-up question. Retrieval only happens when the caller
    /// opts in with `fetch_context` and a store is attached; an unreachable
    /// store degrades to an empty context rather than failing the turn.
    #[instrument(skip(self, session, history, question))]
    pub async fn query(
        &self,
        question: &str,
        session: &SessionContext,
        history: &[ConversationTurn],
        fetch_context: bool,
    ) -> Result<ModelResponse, QueryError> {
        let fragments = match (&self.store, fetch_context) {
            (Some(store), true) => retrieve_or_empty(store.as_ref(), question, self.top_k).await?,
            _ => Vec::new(),
        };

        let retrieved = if fetch_context {
            Some(fragments.as_slice())
        } else {
            None
        };

        let prompt = assemble(COPILOT_TEMPLATE, session, history, question, retrieved)?;
        debug!(
            provider = self.provider.name(),
            fragments = fragments.len(),
            "submitting assembled prompt"
        );
        let content = self.provider.invoke(&prompt).await?;

        let sources = retrieved.map(|fragments| {
            fragments
                .iter()
                .map(|f| f.source_id.clone())
                .collect::<Vec<_>>()
        });

        Ok(ModelResponse { content, sources })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::ProviderError;
    use crate::retrieval::InMemoryStore;
    use crate::session::{AppType, Authentication, Sensitivity};
    use std::sync::atomic::{AtomicU32, Ordering};

    struct EchoProvider {
        calls: AtomicU32,
    }

    #[async_trait::async_trait]
    impl ModelProvider for EchoProvider {
        fn name(&self) -> &'static str {
            "echo"
        }

        async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(format!("answer to: {}", prompt.len()))
        }
    }

    struct DownStore;

    #[async_trait::async_trait]
    impl crate::retrieval::DocumentStore for DownStore {
        async fn similarity_search(
            &self,
            _query: &str,
            _k: usize,
        ) -> Result<Vec<crate::retrieval::RetrievedFragment>, RetrievalError> {
            Err(RetrievalError::Unavailable("connection refused".into()))
        }

        async fn add_document(&self, _id: &str, _text: &str) -> Result<(), RetrievalError> {
            Err(RetrievalError::Unavailable("connection refused".into()))
        }
    }

    fn session() -> SessionContext {
        SessionContext::new(
            "a web app",
            AppType::Web,
            Sensitivity::Secret,
            true,
            Authentication::Mfa,
        )
    }

    #[tokio::test]
    async fn no_context_means_no_sources() {
        let pipeline = RagPipeline::new(Arc::new(EchoProvider {
            calls: AtomicU32::new(0),
        }));
        let response = pipeline
            .query("what next?", &session(), &[], false)
            .await
            .unwrap();
        assert!(response.sources.is_none());
        assert!(!response.content.is_empty());
    }

    #[tokio::test]
    async fn context_carries_fragment_sources() {
        let store = InMemoryStore::new();
        store
            .add_document("doc-7", "token replay guidance")
            .await
            .unwrap();
        let pipeline = RagPipeline::new(Arc::new(EchoProvider {
            calls: AtomicU32::new(0),
        }))
        .with_store(Arc::new(store))
        .with_top_k(3);

        let response = pipeline
            .query("token replay", &session(), &[], true)
            .await
            .unwrap();
        assert_eq!(response.sources.unwrap(), vec!["doc-7".to_string()]);
    }

    #[tokio::test]
    async fn unreachable_store_degrades_to_empty_context() {
        let provider = Arc::new(EchoProvider {
            calls: AtomicU32::new(0),
        });
        let pipeline = RagPipeline::new(provider.clone()).with_store(Arc::new(DownStore));
        let response = pipeline
            .query("anything", &session(), &[], true)
            .await
            .unwrap();
        // The turn still ran, with an empty citation list.
        assert_eq!(response.sources.unwrap(), Vec::<String>::new());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
    }
}
