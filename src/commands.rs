//! UI-facing command layer. Every command returns `Result<_, String>` so the
//! frontend sees plain display text; typed errors stay below this boundary.

use crate::artifacts::Download;
use crate::engine::{ModelResponse, RagPipeline, Workflows};
use crate::prompt::Methodology;
use crate::providers::OpenAiProvider;
use crate::retrieval::DocumentStore;
use crate::retry::TracingReporter;
use crate::session::{
    AppType, Authentication, ConversationTurn, Sensitivity, SessionContext,
};
use std::sync::{Arc, Mutex};
use tracing::{info, instrument};

pub struct AppState {
    pub session: Mutex<SessionContext>,
    pub history: Mutex<Vec<ConversationTurn>>,
    pub workflows: Workflows,
    pub pipeline: RagPipeline,
    pub image_provider: Option<OpenAiProvider>,
    pub documents: Option<Arc<dyn DocumentStore>>,
}

impl AppState {
    pub fn new(workflows: Workflows, pipeline: RagPipeline) -> Self {
        Self {
            session: Mutex::new(SessionContext::default()),
            history: Mutex::new(Vec::new()),
            workflows,
            pipeline,
            image_provider: None,
            documents: None,
        }
    }

    pub fn with_image_provider(mut self, provider: OpenAiProvider) -> Self {
        self.image_provider = Some(provider);
        self
    }

    pub fn with_documents(mut self, documents: Arc<dyn DocumentStore>) -> Self {
        self.documents = Some(documents);
        self
    }

    // Guards are never held across an await; async work runs on a clone.
    fn snapshot(&self) -> Result<SessionContext, String> {
        self.session
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| "session state is unavailable".to_string())
    }

    fn store_session(&self, session: SessionContext) -> Result<(), String> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| "session state is unavailable".to_string())?;
        *guard = session;
        Ok(())
    }
}

/* ---------- session setters ---------- */

pub fn set_application_details(
    state: &AppState,
    description: String,
    app_type: AppType,
    sensitivity: Sensitivity,
    internet_facing: bool,
    authentication: Authentication,
) -> Result<String, String> {
    let mut guard = state
        .session
        .lock()
        .map_err(|_| "session state is unavailable".to_string())?;
    guard.description = description;
    guard.app_type = app_type;
    guard.sensitivity = sensitivity;
    guard.internet_facing = internet_facing;
    guard.authentication = authentication;
    Ok("Application details stored".to_string())
}

/* ---------- artifact generation ---------- */

#[instrument(skip(state))]
pub async fn generate_threat_model(
    state: &AppState,
    methodology: Methodology,
) -> Result<String, String> {
    let mut session = state.snapshot()?;
    let mut reporter = TracingReporter::default();
    let artifact = state
        .workflows
        .threat_model(&mut session, methodology, &mut reporter)
        .await
        .map_err(|e| e.to_string())?;
    state.store_session(session)?;
    info!("threat model updated");
    Ok(artifact.content)
}

#[instrument(skip(state))]
pub async fn generate_attack_tree(state: &AppState) -> Result<String, String> {
    let mut session = state.snapshot()?;
    let mut reporter = TracingReporter::default();
    let artifact = state
        .workflows
        .attack_tree(&mut session, &mut reporter)
        .await
        .map_err(|e| e.to_string())?;
    state.store_session(session)?;
    Ok(artifact.content)
}

#[instrument(skip(state))]
pub async fn generate_mitigations(state: &AppState) -> Result<String, String> {
    let mut session = state.snapshot()?;
    let mut reporter = TracingReporter::default();
    let artifact = state
        .workflows
        .mitigations(&mut session, &mut reporter)
        .await
        .map_err(|e| e.to_string())?;
    state.store_session(session)?;
    Ok(artifact.content)
}

#[instrument(skip(state))]
pub async fn generate_dread_assessment(state: &AppState) -> Result<String, String> {
    let mut session = state.snapshot()?;
    let mut reporter = TracingReporter::default();
    let artifact = state
        .workflows
        .dread_assessment(&mut session, &mut reporter)
        .await
        .map_err(|e| e.to_string())?;
    state.store_session(session)?;
    Ok(artifact.content)
}

#[instrument(skip(state))]
pub async fn generate_test_cases(state: &AppState) -> Result<String, String> {
    let mut session = state.snapshot()?;
    let mut reporter = TracingReporter::default();
    let artifact = state
        .workflows
        .test_cases(&mut session, &mut reporter)
        .await
        .map_err(|e| e.to_string())?;
    state.store_session(session)?;
    Ok(artifact.content)
}

pub fn download_artifact(
    state: &AppState,
    kind: crate::artifacts::ArtifactKind,
) -> Result<Download, String> {
    let session = state.snapshot()?;
    let content = match kind {
        crate::artifacts::ArtifactKind::ThreatModel => session.threat_model,
        crate::artifacts::ArtifactKind::AttackTree => session.attack_tree,
        crate::artifacts::ArtifactKind::Mitigations => session.mitigations,
        crate::artifacts::ArtifactKind::DreadAssessment => session.dread_assessment,
        crate::artifacts::ArtifactKind::TestCases => session.test_cases,
    };
    if content.is_empty() {
        return Err("Nothing to download yet.".to_string());
    }
    Ok(crate::artifacts::GeneratedArtifact { kind, content }.download())
}

/* ---------- architecture diagram analysis ---------- */

#[instrument(skip(state, image_bytes))]
pub async fn analyse_architecture_diagram(
    state: &AppState,
    image_bytes: Vec<u8>,
) -> Result<String, String> {
    let provider = state
        .image_provider
        .as_ref()
        .ok_or_else(|| "Diagram analysis requires an OpenAI API key.".to_string())?;
    let prompt = crate::prompt::templates::image_analysis_prompt();
    let description = provider
        .analyse_image(&prompt, &image_bytes)
        .await
        .map_err(|e| e.to_string())?;

    let mut guard = state
        .session
        .lock()
        .map_err(|_| "session state is unavailable".to_string())?;
    guard.description = description.clone();
    Ok(description)
}

/* ---------- copilot chat ---------- */

#[instrument(skip(state, question))]
pub async fn send_chat_message(
    state: &AppState,
    question: String,
    fetch_context: bool,
) -> Result<ModelResponse, String> {
    let session = state.snapshot()?;
    let history_snapshot = state
        .history
        .lock()
        .map(|guard| guard.clone())
        .map_err(|_| "chat history is unavailable".to_string())?;

    let response = state
        .pipeline
        .query(&question, &session, &history_snapshot, fetch_context)
        .await
        .map_err(|e| e.to_string())?;

    let mut history = state
        .history
        .lock()
        .map_err(|_| "chat history is unavailable".to_string())?;
    history.push(ConversationTurn::user(question));
    history.push(ConversationTurn::bot(response.content.clone()));
    Ok(response)
}

pub fn clear_chat_history(state: &AppState) -> Result<String, String> {
    let mut history = state
        .history
        .lock()
        .map_err(|_| "chat history is unavailable".to_string())?;
    history.clear();
    Ok("Chat history cleared".to_string())
}

/* ---------- knowledge base ingestion ---------- */

#[instrument(skip(state, text))]
pub async fn ingest_document(
    state: &AppState,
    source_id: String,
    text: String,
) -> Result<String, String> {
    let documents = state
        .documents
        .as_ref()
        .ok_or_else(|| "No document store is configured.".to_string())?;
    documents
        .add_document(&source_id, &text)
        .await
        .map_err(|e| e.to_string())?;
    info!(%source_id, "document ingested");
    Ok(format!("Ingested {source_id}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{ModelProvider, ProviderError};
    use crate::retrieval::InMemoryStore;
    use crate::retry::RetryPolicy;

    struct CannedProvider(String);

    #[async_trait::async_trait]
    impl ModelProvider for CannedProvider {
        fn name(&self) -> &'static str {
            "canned"
        }

        async fn invoke(&self, _prompt: &str) -> Result<String, ProviderError> {
            Ok(self.0.clone())
        }
    }

    fn state_with(reply: &str) -> AppState {
        let provider: Arc<dyn ModelProvider> = Arc::new(CannedProvider(reply.to_string()));
        AppState::new(
            Workflows::new(provider.clone(), RetryPolicy::default()),
            RagPipeline::new(provider),
        )
    }

    #[tokio::test]
    async fn chat_appends_both_turns_in_order() {
        let state = state_with("the bot answer");
        send_chat_message(&state, "first question".into(), false)
            .await
            .unwrap();

        let history = state.history.lock().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].message, "first question");
        assert_eq!(history[1].message, "the bot answer");
    }

    #[tokio::test]
    async fn generation_without_details_maps_to_display_text() {
        let state = state_with("{}");
        let err = generate_threat_model(&state, Methodology::Stride)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            "Please enter your application details before submitting."
        );
    }

    #[test]
    fn download_refuses_when_artifact_is_empty() {
        let state = state_with("irrelevant");
        let err =
            download_artifact(&state, crate::artifacts::ArtifactKind::ThreatModel).unwrap_err();
        assert_eq!(err, "Nothing to download yet.");
    }

    #[tokio::test]
    async fn ingestion_lands_in_the_document_store() {
        let store = Arc::new(InMemoryStore::new());
        let state = state_with("unused").with_documents(store.clone());
        ingest_document(&state, "guide-1".into(), "session fixation guidance".into())
            .await
            .unwrap();

        let hits = store.similarity_search("session fixation", 1).await.unwrap();
        assert_eq!(hits[0].source_id, "guide-1");
    }
}
