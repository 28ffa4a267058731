//! Chat-completion provider back-ends behind one uniform invoke contract.
//!
//! A single [`ModelProvider`] capability covers the default hosted API, the
//! enterprise-hosted variant and the alternative vendor; callers pick an
//! implementation once and the pipeline stays provider-agnostic.

pub mod azure;
pub mod google;
pub mod openai;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use azure::AzureProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Authentication failed - check your API key")]
    Auth,
    #[error("Rate limit exceeded - too many requests")]
    RateLimited,
    #[error("Network error: {0}")]
    Network(String),
    #[error("HTTP error {status}: {body}")]
    Http { status: u16, body: String },
    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),
    #[error("Provider returned empty content")]
    EmptyResponse,
}

impl ProviderError {
    pub(crate) fn from_status(status: reqwest::StatusCode, body: String) -> Self {
        match status.as_u16() {
            401 | 403 => ProviderError::Auth,
            429 => ProviderError::RateLimited,
            code => ProviderError::Http { status: code, body },
        }
    }

    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Network("request timeout - the API took too long to respond".into())
        } else if err.is_connect() {
            ProviderError::Network("connection error - unable to reach the API".into())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Uniform contract for a hosted chat-completion back-end.
///
/// `invoke` blocks the calling task until the provider answers or fails and
/// never retries on its own; the retry policy lives with the caller. Errors
/// always propagate for display, they are never swallowed here.
#[async_trait::async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError>;

    /// Whether the back-end can reliably emit diagram source. The
    /// alternative vendor's safety filters block attack-tree generation.
    fn supports_diagrams(&self) -> bool {
        true
    }
}

// OpenAI-compatible chat wire types, shared by the default and
// enterprise-hosted back-ends.

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

impl ChatResponse {
    /// First choice content, rejecting empty payloads.
    pub fn into_content(self) -> Result<String, ProviderError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)?
            .message
            .content;
        if content.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(matches!(
            ProviderError::from_status(reqwest::StatusCode::UNAUTHORIZED, String::new()),
            ProviderError::Auth
        ));
        assert!(matches!(
            ProviderError::from_status(reqwest::StatusCode::TOO_MANY_REQUESTS, String::new()),
            ProviderError::RateLimited
        ));
        assert!(matches!(
            ProviderError::from_status(reqwest::StatusCode::INTERNAL_SERVER_ERROR, "boom".into()),
            ProviderError::Http { status: 500, .. }
        ));
    }

    #[test]
    fn empty_choices_rejected() {
        let response = ChatResponse { choices: vec![] };
        assert!(matches!(
            response.into_content(),
            Err(ProviderError::EmptyResponse)
        ));
    }
}
