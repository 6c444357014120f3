//! Application configuration

pub mod menu;
pub mod prompts;

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use menu::MenuCatalog;

/// Default number of transcript messages replayed to the LLM per turn.
pub const DEFAULT_TRANSCRIPT_CAP: usize = 40;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Provider name: "ollama" or "openai"
    pub provider: String,
    pub model: String,
    pub ollama_url: Option<String>,
    pub openai_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub menu_path: PathBuf,
    pub data_dir: PathBuf,
    pub transcript_cap: usize,
    /// Bound on a single LLM call, in seconds
    pub llm_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            provider: env::var("LLM_PROVIDER").unwrap_or_else(|_| "ollama".into()),
            model: env::var("LLM_MODEL").unwrap_or_else(|_| "llama3.1:8b".into()),
            ollama_url: env::var("OLLAMA_URL").ok(),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            openai_api_key: env::var("OPENAI_API_KEY").ok(),
            menu_path: env::var("PIATTO_MENU")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./menu.toml")),
            data_dir: env::var("PIATTO_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            transcript_cap: env::var("PIATTO_TRANSCRIPT_CAP")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TRANSCRIPT_CAP),
            llm_timeout_secs: env::var("PIATTO_LLM_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(15),
        })
    }
}
