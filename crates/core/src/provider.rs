//! Provider trait — the abstraction over hosted AI services.
//!
//! A Provider knows how to send a conversation to a text-generation service
//! and get a reply back, and how to turn free text into an embedding vector.
//!
//! Implementations: OpenAI-compatible endpoints (OpenAI, OpenRouter, vLLM,
//! any `/v1`-shaped host).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::turn::Turn;

/// A completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderRequest {
    /// The model to use (e.g., "gpt-4o-mini")
    pub model: String,

    /// The full message sequence, system instruction first
    pub messages: Vec<Turn>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

fn default_temperature() -> f32 {
    0.7
}

/// A complete response from a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// The generated reply text
    pub content: String,

    /// Which model actually responded (may differ from requested)
    pub model: String,

    /// Token usage statistics
    pub usage: Option<Usage>,
}

/// Token usage information.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// An embedding request — one input text per call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// The model to use for embeddings (e.g., "text-embedding-3-small")
    pub model: String,

    /// The text to embed
    pub input: String,
}

/// An embedding response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResponse {
    /// The fixed-dimension embedding vector
    pub vector: Vec<f32>,

    /// Which model was used
    pub model: String,

    /// Token usage
    pub usage: Option<Usage>,
}

/// The core Provider trait.
///
/// The pipeline calls `complete()` and `embed()` without knowing which
/// backend is configured — pure polymorphism. A single failed call is enough
/// to trigger the caller's fallback; providers never retry internally.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai").
    fn name(&self) -> &str;

    /// Send a completion request and get a complete response.
    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError>;

    /// Generate an embedding for the given text.
    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_request_defaults() {
        let req = ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![],
            temperature: default_temperature(),
            max_tokens: None,
        };
        assert!((req.temperature - 0.7).abs() < f32::EPSILON);
        assert!(req.max_tokens.is_none());
    }

    #[test]
    fn request_serializes_roles() {
        let req = ProviderRequest {
            model: "gpt-4o-mini".into(),
            messages: vec![Turn::system("Be concise."), Turn::user("Hello")],
            temperature: 0.3,
            max_tokens: Some(512),
        };
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"system\""));
        assert!(json.contains("\"user\""));
        assert!(json.contains("512"));
    }
}
