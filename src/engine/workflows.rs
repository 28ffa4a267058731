//! Artifact generation steps: threat model, attack tree, mitigations,
//! DREAD assessment, test cases.
//!
//! Every step follows the same shape: validate prerequisites (input errors
//! surface immediately, no retry, no provider call), build the prompt, run
//! the provider under the shared retry policy, post-process, then write the
//! artifact into the session.

use crate::artifacts::{ArtifactKind, GeneratedArtifact};
use crate::prompt::templates::{
    attack_tree_prompt, dread_prompt, mitigations_prompt, test_cases_prompt, threat_model_prompt,
};
use crate::prompt::Methodology;
use crate::providers::{ModelProvider, ProviderError};
use crate::report::{
    dread_to_markdown, extract_json, strip_mermaid_fences, threat_model_to_markdown, ReportError,
};
use crate::retry::{Reporter, RetryPolicy};
use crate::session::SessionContext;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// A required prior input or artifact is missing. Reported immediately,
    /// never retried.
    #[error("{0}")]
    MissingInput(String),
    /// The selected provider cannot perform this step.
    #[error("{0}")]
    Unsupported(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error(transparent)]
    Report(#[from] ReportError),
}

pub struct Workflows {
    provider: Arc<dyn ModelProvider>,
    retry: RetryPolicy,
}

impl Workflows {
    pub fn new(provider: Arc<dyn ModelProvider>, retry: RetryPolicy) -> Self {
        Self { provider, retry }
    }

    fn require_description(session: &SessionContext) -> Result<(), WorkflowError> {
        if session.has_description() {
            Ok(())
        } else {
            Err(WorkflowError::MissingInput(
                "Please enter your application details before submitting.".to_string(),
            ))
        }
    }

    fn require_threat_model(
        session: &SessionContext,
        message: &str,
    ) -> Result<(), WorkflowError> {
        if session.has_threat_model() {
            Ok(())
        } else {
            Err(WorkflowError::MissingInput(message.to_string()))
        }
    }

    #[instrument(skip(self, session, reporter))]
    pub async fn threat_model(
        &self,
        session: &mut SessionContext,
        methodology: Methodology,
        reporter: &mut dyn Reporter,
    ) -> Result<GeneratedArtifact, WorkflowError> {
        Self::require_description(session)?;
        let prompt = threat_model_prompt(methodology, session);

        // Parsing stays inside the retry loop: a malformed JSON reply is as
        // transient as a 429.
        let markdown = self
            .retry
            .run("generating threat model", reporter, || async {
                let raw = self.provider.invoke(&prompt).await?;
                let parsed = extract_json(&raw)?;
                Ok::<_, WorkflowError>(threat_model_to_markdown(&parsed))
            })
            .await?;

        info!(methodology = %methodology, "threat model generated");
        session.threat_model = markdown.clone();
        Ok(GeneratedArtifact {
            kind: ArtifactKind::ThreatModel,
            content: markdown,
        })
    }

    #[instrument(skip(self, session, reporter))]
    pub async fn attack_tree(
        &self,
        session: &mut SessionContext,
        reporter: &mut dyn Reporter,
    ) -> Result<GeneratedArtifact, WorkflowError> {
        Self::require_description(session)?;
        if !self.provider.supports_diagrams() {
            return Err(WorkflowError::Unsupported(format!(
                "{} cannot reliably generate attack trees. Please use a different model provider.",
                self.provider.name()
            )));
        }

        let prompt = attack_tree_prompt(session);
        let raw = self
            .retry
            .run("generating attack tree", reporter, || {
                self.provider.invoke(&prompt)
            })
            .await?;

        let mermaid = strip_mermaid_fences(&raw);
        session.attack_tree = mermaid.clone();
        Ok(GeneratedArtifact {
            kind: ArtifactKind::AttackTree,
            content: mermaid,
        })
    }

    #[instrument(skip(self, session, reporter))]
    pub async fn mitigations(
        &self,
        session: &mut SessionContext,
        reporter: &mut dyn Reporter,
    ) -> Result<GeneratedArtifact, WorkflowError> {
        Self::require_threat_model(
            session,
            "Please generate a threat model first before suggesting mitigations.",
        )?;

        let prompt = mitigations_prompt(&session.threat_model);
        let markdown = self
            .retry
            .run("suggesting mitigations", reporter, || {
                self.provider.invoke(&prompt)
            })
            .await?;

        session.mitigations = markdown.clone();
        Ok(GeneratedArtifact {
            kind: ArtifactKind::Mitigations,
            content: markdown,
        })
    }

    #[instrument(skip(self, session, reporter))]
    pub async fn dread_assessment(
        &self,
        session: &mut SessionContext,
        reporter: &mut dyn Reporter,
    ) -> Result<GeneratedArtifact, WorkflowError> {
        Self::require_threat_model(
            session,
            "Please generate a threat model first before requesting a DREAD risk assessment.",
        )?;

        let prompt = dread_prompt(&session.threat_model);
        let markdown = self
            .retry
            .run("generating DREAD risk assessment", reporter, || async {
                let raw = self.provider.invoke(&prompt).await?;
                let parsed = extract_json(&raw)?;
                Ok::<_, WorkflowError>(dread_to_markdown(&parsed))
            })
            .await?;

        session.dread_assessment = markdown.clone();
        Ok(GeneratedArtifact {
            kind: ArtifactKind::DreadAssessment,
            content: markdown,
        })
    }

    #[instrument(skip(self, session, reporter))]
    pub async fn test_cases(
        &self,
        session: &mut SessionContext,
        reporter: &mut dyn Reporter,
    ) -> Result<GeneratedArtifact, WorkflowError> {
        Self::require_threat_model(
            session,
            "Please generate a threat model first before requesting test cases.",
        )?;

        let prompt = test_cases_prompt(&session.threat_model);
        let markdown = self
            .retry
            .run("generating test cases", reporter, || {
                self.provider.invoke(&prompt)
            })
            .await?;

        session.test_cases = markdown.clone();
        Ok(GeneratedArtifact {
            kind: ArtifactKind::TestCases,
            content: markdown,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::tests::RecordingReporter;
    use crate::session::{AppType, Authentication, Sensitivity};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Plays back a scripted sequence of responses and counts invocations.
    struct ScriptedProvider {
        responses: Mutex<Vec<Result<String, ProviderError>>>,
        calls: AtomicU32,
        diagrams: bool,
    }

    impl ScriptedProvider {
        fn replying(responses: Vec<Result<String, ProviderError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: AtomicU32::new(0),
                diagrams: true,
            }
        }

        fn call_count(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "Scripted"
        }

        fn supports_diagrams(&self) -> bool {
            self.diagrams
        }

        async fn invoke(&self, _prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                Err(ProviderError::EmptyResponse)
            } else {
                responses.remove(0)
            }
        }
    }

    fn web_oauth_session() -> SessionContext {
        SessionContext::new(
            "A customer portal",
            AppType::Web,
            Sensitivity::Confidential,
            true,
            Authentication::Oauth2,
        )
    }

    const THREAT_MODEL_JSON: &str = r#"{"threat_model": [
        {"Threat Type": "Spoofing", "Scenario": "Replayed OAuth token", "Potential Impact": "Account takeover"}
    ], "improvement_suggestions": []}"#;

    #[tokio::test]
    async fn mitigations_before_threat_model_is_an_input_error_with_no_provider_call() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok("unused".into())]));
        let workflows = Workflows::new(provider.clone(), RetryPolicy::default());
        let mut session = web_oauth_session();
        let mut reporter = RecordingReporter::default();

        let err = workflows
            .mitigations(&mut session, &mut reporter)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Please generate a threat model first before suggesting mitigations."
        );
        assert_eq!(provider.call_count(), 0);
        assert!(reporter.warnings.is_empty());
    }

    #[tokio::test]
    async fn threat_model_then_mitigations_round_trip() {
        let provider = Arc::new(ScriptedProvider::replying(vec![
            Ok(THREAT_MODEL_JSON.to_string()),
            Ok("| Spoofing | Replayed OAuth token | Rotate tokens |".to_string()),
        ]));
        let workflows = Workflows::new(provider.clone(), RetryPolicy::default());
        let mut session = web_oauth_session();
        let mut reporter = RecordingReporter::default();

        let threat_model = workflows
            .threat_model(&mut session, Methodology::Stride, &mut reporter)
            .await
            .unwrap();
        assert_eq!(threat_model.kind, ArtifactKind::ThreatModel);
        assert!(session.threat_model.contains("Replayed OAuth token"));

        let mitigations = workflows
            .mitigations(&mut session, &mut reporter)
            .await
            .unwrap();
        assert_eq!(mitigations.download().file_name, "mitigations.md");
        assert!(session.mitigations.contains("Rotate tokens"));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn threat_model_without_description_never_calls_the_provider() {
        let provider = Arc::new(ScriptedProvider::replying(vec![]));
        let workflows = Workflows::new(provider.clone(), RetryPolicy::default());
        let mut session = SessionContext::default();
        let mut reporter = RecordingReporter::default();

        let err = workflows
            .threat_model(&mut session, Methodology::Stride, &mut reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::MissingInput(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn transient_failures_warn_then_succeed() {
        let provider = Arc::new(ScriptedProvider::replying(vec![
            Err(ProviderError::RateLimited),
            Err(ProviderError::RateLimited),
            Ok(THREAT_MODEL_JSON.to_string()),
        ]));
        let workflows = Workflows::new(provider.clone(), RetryPolicy::new(3));
        let mut session = web_oauth_session();
        let mut reporter = RecordingReporter::default();

        let artifact = workflows
            .threat_model(&mut session, Methodology::Stride, &mut reporter)
            .await
            .unwrap();
        assert!(artifact.content.contains("Spoofing"));
        assert_eq!(reporter.warnings.len(), 2);
        assert!(reporter.errors.is_empty());
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_a_terminal_error() {
        let provider = Arc::new(ScriptedProvider::replying(vec![
            Err(ProviderError::RateLimited),
            Err(ProviderError::RateLimited),
            Err(ProviderError::RateLimited),
        ]));
        let workflows = Workflows::new(provider.clone(), RetryPolicy::new(3));
        let mut session = web_oauth_session();
        session.threat_model = "| existing |".to_string();
        let mut reporter = RecordingReporter::default();

        let err = workflows
            .test_cases(&mut session, &mut reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Provider(_)));
        assert_eq!(reporter.warnings.len(), 2);
        assert_eq!(reporter.errors.len(), 1);
        // The failed step must not clobber the session.
        assert!(session.test_cases.is_empty());
    }

    #[tokio::test]
    async fn attack_tree_refuses_providers_without_diagram_support() {
        let mut provider = ScriptedProvider::replying(vec![Ok("graph TD".into())]);
        provider.diagrams = false;
        let provider = Arc::new(provider);
        let workflows = Workflows::new(provider.clone(), RetryPolicy::default());
        let mut session = web_oauth_session();
        let mut reporter = RecordingReporter::default();

        let err = workflows
            .attack_tree(&mut session, &mut reporter)
            .await
            .unwrap_err();
        assert!(matches!(err, WorkflowError::Unsupported(_)));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn attack_tree_strips_fences_and_downloads_as_plain_text() {
        let provider = Arc::new(ScriptedProvider::replying(vec![Ok(
            "```mermaid\ngraph TD\nA[\"Steal data\"]\n```".to_string(),
        )]));
        let workflows = Workflows::new(provider, RetryPolicy::default());
        let mut session = web_oauth_session();
        let mut reporter = RecordingReporter::default();

        let artifact = workflows
            .attack_tree(&mut session, &mut reporter)
            .await
            .unwrap();
        assert_eq!(artifact.content, "graph TD\nA[\"Steal data\"]");
        let download = artifact.download();
        assert_eq!(download.file_name, "attack_tree.md");
        assert_eq!(download.mime_type, "text/plain");
    }
}
