//! LLM provider integrations

pub mod ollama;
pub mod openai_compat;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::config::Config;
use crate::conversation::Message;

pub use ollama::OllamaClient;
pub use openai_compat::{OpenAiCompatClient, OpenAiCompatConfig};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// The LLM collaborator seam. One call per delegated turn; implementations
/// carry a bounded timeout and no internal retry - a failure here degrades
/// to a scripted reply upstream.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError>;
}

/// Build the configured provider by name.
pub fn from_config(config: &Config) -> Result<Arc<dyn LlmClient>, ProviderError> {
    match config.provider.to_lowercase().as_str() {
        "ollama" => {
            let url = config
                .ollama_url
                .clone()
                .unwrap_or_else(|| "http://localhost:11434".into());
            Ok(Arc::new(OllamaClient::new(
                url,
                config.model.clone(),
                config.llm_timeout_secs,
            )))
        }
        "openai" => {
            let api_key = config
                .openai_api_key
                .clone()
                .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY".into()))?;
            let compat = OpenAiCompatConfig {
                base_url: config
                    .openai_base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com/v1".into()),
                api_key: Some(api_key),
                model: config.model.clone(),
                timeout_secs: config.llm_timeout_secs,
            };
            Ok(Arc::new(OpenAiCompatClient::new(compat)))
        }
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
