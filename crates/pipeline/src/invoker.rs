//! Completion invoker — the single call to the text-generation service.
//!
//! Prepends the assembled instruction as a leading system turn, appends the
//! caller's turns unmodified, and submits once with fixed policy parameters.
//! No retries; upstream failures surface to the caller with their status
//! preserved for diagnostics.

use shepherd_core::error::ProviderError;
use shepherd_core::provider::{Provider, ProviderRequest};
use shepherd_core::turn::Turn;
use std::sync::Arc;
use tracing::debug;

/// Invokes the text-generation service.
pub struct CompletionInvoker {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl CompletionInvoker {
    /// Create a new invoker with fixed generation parameters.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        max_tokens: u32,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens,
        }
    }

    /// Send the assembled instruction plus conversation and return the reply.
    pub async fn complete(
        &self,
        system_instruction: &str,
        turns: &[Turn],
    ) -> Result<String, ProviderError> {
        let mut messages = Vec::with_capacity(turns.len() + 1);
        messages.push(Turn::system(system_instruction));
        messages.extend_from_slice(turns);

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: Some(self.max_tokens),
        };

        debug!(model = %self.model, turns = turns.len(), "Requesting completion");
        let response = self.provider.complete(request).await?;
        Ok(response.content)
    }
}
