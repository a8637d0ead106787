//! Embedding client — free text in, fixed-dimension vector out.
//!
//! Every failure mode of the upstream service collapses into the single
//! `EmbeddingUnavailable` signal; the matcher responds by moving down its
//! fallback ladder rather than crashing.

use shepherd_core::provider::{EmbeddingRequest, Provider};
use std::sync::Arc;
use tracing::warn;

/// The single failure signal for the embedding step.
///
/// Upstream unreachable, non-2xx, malformed payload, timeout, and empty
/// input all map here. No retries — one failed call is sufficient to
/// trigger fallback for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddingUnavailable;

/// Stateless wrapper over the provider's embedding endpoint. No caching.
pub struct EmbeddingClient {
    provider: Arc<dyn Provider>,
    model: String,
}

impl EmbeddingClient {
    /// Create a new embedding client for the given model.
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// Embed one text.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingUnavailable> {
        if text.trim().is_empty() {
            return Err(EmbeddingUnavailable);
        }

        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: text.to_string(),
        };

        match self.provider.embed(request).await {
            Ok(response) if !response.vector.is_empty() => Ok(response.vector),
            Ok(_) => {
                warn!("Embedding service returned an empty vector");
                Err(EmbeddingUnavailable)
            }
            Err(e) => {
                warn!(error = %e, "Embedding unavailable");
                Err(EmbeddingUnavailable)
            }
        }
    }
}
