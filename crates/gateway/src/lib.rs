//! HTTP API gateway for Shepherd.
//!
//! Exposes the mentor-chat endpoint, a health check, and the template
//! editor surface. JSON bodies in both directions, permissive CORS — the
//! inbound caller is a browser client on another origin.
//!
//! Built on Axum for high performance async HTTP.

use axum::Router;
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use shepherd_core::error::{Error, ProviderError};
use shepherd_core::template::{InstructionTemplate, MENTOR_TEMPLATE_KEY, PromptStore, TemplateRevision};
use shepherd_core::turn::Turn;
use shepherd_pipeline::ChatPipeline;

/// Shared application state for the gateway.
pub struct GatewayState {
    pub pipeline: ChatPipeline,
    pub store: Arc<dyn PromptStore>,
}

type SharedState = Arc<GatewayState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/template", get(get_template_handler).put(put_template_handler))
        .route("/template/revisions", get(list_revisions_handler))
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024)) // 1 MB body limit
        .layer(CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
pub async fn start(config: shepherd_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let store = Arc::new(shepherd_store::SqliteStore::new(&config.store.path).await?);
    let provider = shepherd_providers::build_from_config(&config);
    let pipeline = ChatPipeline::new(store.clone(), store.clone(), provider, &config);

    let state = Arc::new(GatewayState { pipeline, store });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Deserialize)]
struct ChatRequest {
    turns: Vec<Turn>,
}

/// The caller receives either a reply or a single error message — never a
/// partially-assembled artifact.
#[derive(Serialize)]
#[serde(untagged)]
enum ChatResponse {
    Reply { reply: String },
    Error { error: String },
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> (StatusCode, Json<ChatResponse>) {
    match state.pipeline.handle_chat(&payload.turns).await {
        Ok(reply) => (StatusCode::OK, Json(ChatResponse::Reply { reply })),
        Err(e) => {
            error!(error = %e, "Mentor chat failed");
            (error_status(&e), Json(ChatResponse::Error { error: e.to_string() }))
        }
    }
}

/// Configuration problems are ours (500); upstream failures are a bad
/// gateway (502).
fn error_status(error: &Error) -> StatusCode {
    match error {
        Error::Provider(ProviderError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

async fn get_template_handler(
    State(state): State<SharedState>,
) -> Result<Json<InstructionTemplate>, StatusCode> {
    state
        .store
        .get_current(MENTOR_TEMPLATE_KEY)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Template fetch failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[derive(Deserialize)]
struct PutTemplateRequest {
    text: String,
    editor_id: String,
}

async fn put_template_handler(
    State(state): State<SharedState>,
    Json(payload): Json<PutTemplateRequest>,
) -> Result<Json<InstructionTemplate>, StatusCode> {
    state
        .store
        .set_current(MENTOR_TEMPLATE_KEY, &payload.text, &payload.editor_id)
        .await
        .map_err(|e| {
            error!(error = %e, "Template save failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    state
        .store
        .get_current(MENTOR_TEMPLATE_KEY)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Template readback failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}

#[derive(Deserialize)]
struct RevisionsQuery {
    #[serde(default = "default_revisions_limit")]
    limit: usize,
}

fn default_revisions_limit() -> usize {
    20
}

async fn list_revisions_handler(
    State(state): State<SharedState>,
    Query(query): Query<RevisionsQuery>,
) -> Result<Json<Vec<TemplateRevision>>, StatusCode> {
    state
        .store
        .list_revisions(MENTOR_TEMPLATE_KEY, query.limit)
        .await
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Revision list failed");
            StatusCode::INTERNAL_SERVER_ERROR
        })
}
