use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::chunk::{ChunkParams, DEFAULT_CHUNK_WORDS, DEFAULT_OVERLAP_WORDS};
use crate::retrieve::{DEFAULT_TOP_K_MULTI, DEFAULT_TOP_K_SINGLE};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub websearch: WebSearchConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_words")]
    pub chunk_words: usize,
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_words: DEFAULT_CHUNK_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
        }
    }
}

impl ChunkingConfig {
    /// Convert into validated parameters. Fails fast on `overlap >= size`.
    pub fn params(&self) -> Result<ChunkParams> {
        ChunkParams::new(self.chunk_words, self.overlap_words)
    }
}

fn default_chunk_words() -> usize {
    DEFAULT_CHUNK_WORDS
}
fn default_overlap_words() -> usize {
    DEFAULT_OVERLAP_WORDS
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Chunks selected when a single document is pinned as the context.
    #[serde(default = "default_top_k_single")]
    pub top_k_single: usize,
    /// Chunks selected across a workspace or a user's whole library.
    #[serde(default = "default_top_k_multi")]
    pub top_k_multi: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k_single: DEFAULT_TOP_K_SINGLE,
            top_k_multi: DEFAULT_TOP_K_MULTI,
        }
    }
}

fn default_top_k_single() -> usize {
    DEFAULT_TOP_K_SINGLE
}
fn default_top_k_multi() -> usize {
    DEFAULT_TOP_K_MULTI
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Ordered fallback list: the first model is tried first; on a
    /// rate-limited response the next model is tried after `retry_delay_secs`.
    #[serde(default = "default_models")]
    pub models: Vec<String>,
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key_env: default_api_key_env(),
            models: default_models(),
            retry_delay_secs: default_retry_delay_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_base() -> String {
    "https://api.openai.com/v1".to_string()
}
fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}
fn default_models() -> Vec<String> {
    vec![
        "gpt-4o-mini".to_string(),
        "gpt-4o".to_string(),
        "gpt-3.5-turbo".to_string(),
    ]
}
fn default_retry_delay_secs() -> u64 {
    2
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    /// Search endpoint. Credentials come from `api_key_env`; a missing key
    /// degrades to "no web context" rather than failing the request.
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_search_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            endpoint: default_search_endpoint(),
            api_key_env: default_search_key_env(),
            max_results: default_max_results(),
            timeout_secs: default_search_timeout_secs(),
        }
    }
}

fn default_search_endpoint() -> String {
    "https://api.tavily.com/search".to_string()
}
fn default_search_key_env() -> String {
    "TAVILY_API_KEY".to_string()
}
fn default_max_results() -> usize {
    3
}
fn default_search_timeout_secs() -> u64 {
    15
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate chunking (fail fast on overlap >= size)
    config.chunking.params()?;

    // Validate retrieval
    if config.retrieval.top_k_single < 1 || config.retrieval.top_k_multi < 1 {
        anyhow::bail!("retrieval.top_k_single and top_k_multi must be >= 1");
    }

    // Validate completion
    if config.completion.models.is_empty() {
        anyhow::bail!("completion.models must list at least one model");
    }

    Ok(config)
}
