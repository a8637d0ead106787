//! Configuration loading, validation, and management for Shepherd.
//!
//! Loads configuration from `~/.shepherd/config.toml` with environment
//! variable overrides for secrets. Validates all settings at startup.
//! Every policy value the pipeline depends on (similarity threshold, result
//! caps, snippet budget, generation parameters, timeouts) lives here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.shepherd/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the hosted AI services
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible endpoint
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for chat completions
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for embeddings
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Generation temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per generated reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Timeout applied to every outbound HTTP call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Retrieval policy (thresholds and caps)
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_chat_model() -> String {
    "gpt-4o-mini".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_request_timeout_secs() -> u64 {
    30
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("embedding_model", &self.embedding_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retrieval", &self.retrieval)
            .field("gateway", &self.gateway)
            .field("store", &self.store)
            .finish()
    }
}

/// Retrieval policy values — thresholds and caps for the matcher, the
/// auxiliary fetcher, and the assembler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Minimum similarity for a ranked match (0–1 cosine-like scale)
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Result cap on the ranked path
    #[serde(default = "default_match_limit")]
    pub match_limit: usize,

    /// Result cap on the category-filtered fallback path
    #[serde(default = "default_fallback_limit")]
    pub fallback_limit: usize,

    /// Static category flag used by the fallback path
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,

    /// Cap on auxiliary (curated lesson) items
    #[serde(default = "default_aux_limit")]
    pub aux_limit: usize,

    /// Character budget for each entry description in the prompt
    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,
}

fn default_min_similarity() -> f32 {
    0.5
}
fn default_match_limit() -> usize {
    5
}
fn default_fallback_limit() -> usize {
    20
}
fn default_fallback_category() -> String {
    "care".into()
}
fn default_aux_limit() -> usize {
    10
}
fn default_snippet_chars() -> usize {
    150
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_similarity: default_min_similarity(),
            match_limit: default_match_limit(),
            fallback_limit: default_fallback_limit(),
            fallback_category: default_fallback_category(),
            aux_limit: default_aux_limit(),
            snippet_chars: default_snippet_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8787
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_path() -> String {
    AppConfig::config_dir()
        .join("shepherd.db")
        .to_string_lossy()
        .into_owned()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.shepherd/config.toml).
    ///
    /// Also checks environment variables for the API key:
    /// - `SHEPHERD_API_KEY` (highest priority)
    /// - `OPENAI_API_KEY`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        // Environment variable overrides (highest priority)
        if config.api_key.is_none() {
            config.api_key = std::env::var("SHEPHERD_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(base_url) = std::env::var("SHEPHERD_BASE_URL") {
            config.base_url = base_url;
        }

        if let Ok(model) = std::env::var("SHEPHERD_MODEL") {
            config.chat_model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".shepherd")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.temperature < 0.0 || self.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if !(0.0..=1.0).contains(&self.retrieval.min_similarity) {
            return Err(ConfigError::ValidationError(
                "retrieval.min_similarity must be between 0.0 and 1.0".into(),
            ));
        }

        if self.retrieval.match_limit == 0
            || self.retrieval.fallback_limit == 0
            || self.retrieval.aux_limit == 0
        {
            return Err(ConfigError::ValidationError(
                "retrieval caps must be greater than zero".into(),
            ));
        }

        if self.retrieval.snippet_chars == 0 {
            return Err(ConfigError::ValidationError(
                "retrieval.snippet_chars must be greater than zero".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "request_timeout_secs must be greater than zero".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            embedding_model: default_embedding_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            retrieval: RetrievalConfig::default(),
            gateway: GatewayConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
