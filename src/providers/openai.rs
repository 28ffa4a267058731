//! Default hosted provider (OpenAI chat completions API).

use super::{ChatMessage, ChatRequest, ChatResponse, ModelProvider, ProviderError};
use base64::Engine as _;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn post_chat(&self, body: &serde_json::Value) -> Result<ChatResponse, ProviderError> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
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
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }

    /// Describe an uploaded architecture diagram. Raw image bytes are
    /// base64-encoded into a data URL for the vision endpoint.
    ///
    /// Vision input is specific to this back-end, so it lives off the trait;
    /// diagram analysis is only offered when this provider is selected.
    #[instrument(skip(self, prompt, image_bytes))]
    pub async fn analyse_image(
        &self,
        prompt: &str,
        image_bytes: &[u8],
    ) -> Result<String, ProviderError> {
        let encoded = base64::engine::general_purpose::STANDARD.encode(image_bytes);
        let body = json!({
            "model": self.model,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": format!("data:image/jpeg;base64,{encoded}") }
                    }
                ]
            }],
            "max_tokens": 1000,
        });
        self.post_chat(&body).await?.into_content()
    }
}

#[async_trait::async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI API"
    }

    #[instrument(skip(self, prompt))]
    async fn invoke(&self, prompt: &str) -> Result<String, ProviderError> {
        debug!(model = %self.model, prompt_chars = prompt.len(), "invoking chat completion");
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            max_tokens: None,
            temperature: Some(0.7),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
        self.post_chat(&body).await?.into_content()
    }
}
