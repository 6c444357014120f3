//! Ollama provider implementation
//!
//! Streams the chat response and assembles the NDJSON chunks into one final
//! string; unparseable chunks are skipped. The whole call is bounded by the
//! client timeout.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::conversation::{Message, Role};

use super::{LlmClient, ProviderError};

pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

/// Low temperature and a short prediction cap keep the assistant terse and
/// its tool payloads well-formed.
#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaChunk {
    #[serde(default)]
    message: Option<OllamaChunkMessage>,
}

#[derive(Debug, Deserialize)]
struct OllamaChunkMessage {
    #[serde(default)]
    content: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url,
            model,
        }
    }

    fn chat_url(&self) -> String {
        if self.base_url.contains("/api/chat") {
            self.base_url.clone()
        } else {
            format!("{}/api/chat", self.base_url)
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn chat(&self, messages: &[Message]) -> Result<String, ProviderError> {
        let ollama_messages: Vec<OllamaMessage> = messages
            .iter()
            .map(|m| OllamaMessage {
                role: match m.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: m.content.clone(),
            })
            .collect();

        let request = OllamaRequest {
            model: self.model.clone(),
            messages: ollama_messages,
            stream: true,
            options: OllamaOptions {
                temperature: 0.3,
                num_predict: 100,
            },
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::InvalidResponse(format!(
                "{}: {}",
                status, body
            )));
        }

        let mut stream = response.bytes_stream();
        let mut buffer: Vec<u8> = Vec::new();
        let mut full_text = String::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            buffer.extend_from_slice(&chunk);

            while let Some(pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=pos).collect();
                append_chunk(&line, &mut full_text);
            }
        }
        if !buffer.is_empty() {
            append_chunk(&buffer, &mut full_text);
        }

        let text = full_text.trim().to_string();
        if text.is_empty() {
            return Err(ProviderError::InvalidResponse(
                "empty response from model".to_string(),
            ));
        }
        Ok(text)
    }
}

fn append_chunk(line: &[u8], full_text: &mut String) {
    if line.iter().all(|b| b.is_ascii_whitespace()) {
        return;
    }
    match serde_json::from_slice::<OllamaChunk>(line) {
        Ok(OllamaChunk {
            message: Some(message),
        }) => full_text.push_str(&message.content),
        Ok(_) => {}
        Err(_) => {}
    }
}
