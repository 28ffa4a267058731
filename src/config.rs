//! Runtime configuration: `.env` keys with an optional TOML overlay.
//!
//! Environment variables win over the file, so deployments can override a
//! checked-in config without editing it. Provider credentials only ever come
//! from the environment.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required setting: {0}")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub openai_model: Option<String>,
    #[serde(default)]
    pub azure_endpoint: Option<String>,
    #[serde(default)]
    pub azure_deployment: Option<String>,
    #[serde(default)]
    pub google_model: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default)]
    pub vector_store_url: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordStoreConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub record_store: RecordStoreConfig,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Per-request HTTP timeout, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Never read from the overlay file; populated from the environment only.
    #[serde(skip)]
    pub openai_api_key: Option<String>,
    #[serde(skip)]
    pub azure_api_key: Option<String>,
    #[serde(skip)]
    pub google_api_key: Option<String>,
}

fn default_top_k() -> usize {
    5
}

fn default_max_attempts() -> u32 {
    3
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: ProviderConfig::default(),
            retrieval: RetrievalConfig {
                top_k: default_top_k(),
                ..RetrievalConfig::default()
            },
            record_store: RecordStoreConfig::default(),
            max_attempts: default_max_attempts(),
            timeout_secs: default_timeout_secs(),
            openai_api_key: None,
            azure_api_key: None,
            google_api_key: None,
        }
    }
}

impl Config {
    /// Loads `.env`, then the optional overlay file, then applies environment
    /// overrides on top.
    pub fn load(overlay: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match overlay {
            Some(path) => {
                debug!(path = %path.display(), "reading config overlay");
                toml::from_str(&fs::read_to_string(path)?)?
            }
            None => Config::default(),
        };
        config.apply_env();
        Ok(config)
    }

    fn apply_env(&mut self) {
        self.openai_api_key = env_opt("OPENAI_API_KEY");
        self.azure_api_key = env_opt("AZURE_OPENAI_API_KEY");
        self.google_api_key = env_opt("GOOGLE_API_KEY");

        if let Some(model) = env_opt("OPENAI_MODEL") {
            self.providers.openai_model = Some(model);
        }
        if let Some(endpoint) = env_opt("AZURE_OPENAI_ENDPOINT") {
            self.providers.azure_endpoint = Some(endpoint);
        }
        if let Some(deployment) = env_opt("AZURE_OPENAI_DEPLOYMENT") {
            self.providers.azure_deployment = Some(deployment);
        }
        if let Some(model) = env_opt("GOOGLE_MODEL") {
            self.providers.google_model = Some(model);
        }
        if let Some(url) = env_opt("VECTOR_STORE_URL") {
            self.retrieval.vector_store_url = Some(url);
        }
        if let Some(url) = env_opt("RECORD_STORE_URL") {
            self.record_store.url = Some(url);
        }
    }

    pub fn openai_model(&self) -> &str {
        self.providers
            .openai_model
            .as_deref()
            .unwrap_or("gpt-4o")
    }

    pub fn google_model(&self) -> &str {
        self.providers
            .google_model
            .as_deref()
            .unwrap_or("gemini-1.5-pro")
    }

    pub fn require_openai_key(&self) -> Result<&str, ConfigError> {
        self.openai_api_key
            .as_deref()
            .ok_or(ConfigError::Missing("OPENAI_API_KEY"))
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}
