//! `shepherd ask` — One-shot question through the full pipeline.

use shepherd_config::AppConfig;
use shepherd_core::turn::Turn;
use shepherd_pipeline::ChatPipeline;
use shepherd_store::SqliteStore;
use std::sync::Arc;

pub async fn run(question: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    let store = Arc::new(SqliteStore::new(&config.store.path).await?);
    let provider = shepherd_providers::build_from_config(&config);
    let pipeline = ChatPipeline::new(store.clone(), store, provider, &config);

    let reply = pipeline.handle_chat(&[Turn::user(question)]).await?;
    println!("{reply}");

    Ok(())
}
