//! Enterprise-hosted provider variant (Azure OpenAI Service).
//!
//! Same wire format as the default back-end, but addressed by resource
//! endpoint plus deployment name and authenticated with an `api-key` header.

use super::{ChatMessage, ChatRequest, ChatResponse, ModelProvider, ProviderError};
use reqwest::Client;
use std::time::Duration;
use tracing::instrument;
use url::Url;

pub const API_VERSION: &str = "2023-12-01-preview";

pub struct AzureProvider {
    client: Client,
    endpoint: Url,
    api_key: String,
    deployment: String,
    api_version: String,
}

impl AzureProvider {
    pub fn new(
        endpoint: &str,
        api_key: impl Into<String>,
        deployment: impl Into<String>,
    ) -> Result<Self, ProviderError> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| ProviderError::Network(format!("invalid endpoint: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: api_key.into(),
            deployment: deployment.into(),
            api_version: API_VERSION.to_string(),
        })
    }

    fn chat_url(&self) -> Result<Url, ProviderError> {
        let mut url = self
            .endpoint
            .join(&format!(
                "openai/deployments/{}/chat/completions",
                self.deployment
            ))
            .map_err(|e| ProviderError::Network(format!("invalid endpoint: {e}")))?;
        url.query_pairs_mut()
            .append_pair("api-version", &self.api_version);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ModelProvider for AzureProvider {
    fn name(&self) -> &'static str {
        "Azure OpenAI Service"
    }

    #[instrument(skip(self, prompt))]
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        let request = ChatRequest {
            // The deployment decides the model; the field is informational.
            model: self.deployment.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: Some(0.7),
        };

        let response = self
            .client
            .post(self.chat_url()?)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?
            .into_content()
    }
}
