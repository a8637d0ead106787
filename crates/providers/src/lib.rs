//! Hosted AI service clients for Shepherd.
//!
//! One implementation covers both network boundaries the pipeline talks to:
//! the embedding service and the text-generation service, via any
//! OpenAI-compatible `/v1` endpoint.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use shepherd_config::AppConfig;
use shepherd_core::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// The API key may be absent — the provider then fails fast with
/// `NotConfigured` on first use, before any network call. Startup itself
/// does not require credentials (the gateway can serve /health and the
/// template editor without them).
pub fn build_from_config(config: &AppConfig) -> Arc<dyn Provider> {
    Arc::new(OpenAiCompatProvider::new(
        "openai",
        config.base_url.clone(),
        config.api_key.clone().unwrap_or_default(),
        std::time::Duration::from_secs(config.request_timeout_secs),
    ))
}
