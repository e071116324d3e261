//! HTTP surface for helpdesk.
//!
//! Three routes: `POST /chat` for the widget, `GET /metrics` for
//! operators, `GET /health` for monitoring. Startup is fail-fast:
//! config, prompts, provider reachability, and knowledge ingestion are
//! all verified before the listener binds, so a running process is a
//! working one.
//!
//! Built on Axum for async HTTP.

use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use helpdesk_chat::{ConversationService, StaticPrompts};
use helpdesk_config::AppConfig;
use helpdesk_core::{Error, SessionId};

/// Chat payloads are small; anything bigger than this is not a chat message.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared application state for the gateway.
pub struct AppState {
    pub service: ConversationService,
}

type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
pub fn build_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
        .allow_headers([axum::http::header::CONTENT_TYPE]);

    Router::new()
        .route("/chat", post(chat_handler))
        .route("/metrics", get(metrics_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Verifies every dependency before binding: invalid config, unreadable
/// prompts, an unreachable provider, or an empty knowledge index all
/// abort startup here rather than failing the first user.
pub async fn start(config: AppConfig) -> Result<(), Error> {
    config.validate().map_err(|e| Error::Config {
        message: e.to_string(),
    })?;

    let prompts = StaticPrompts::load(&config.prompts)?;

    let provider = helpdesk_providers::build_from_config(&config)?;
    match provider.health_check().await {
        Ok(true) => info!(provider = provider.name(), "Provider reachable"),
        Ok(false) => {
            return Err(Error::Config {
                message: format!("Provider {} failed health check", provider.name()),
            })
        }
        Err(e) => {
            return Err(Error::Config {
                message: format!("Provider {} unreachable: {e}", provider.name()),
            })
        }
    }

    let knowledge = helpdesk_knowledge::build_from_config(
        &config.knowledge,
        provider.clone(),
        &config.embedding_model,
    );
    let chunk_count = helpdesk_knowledge::ingest_document(
        knowledge.as_ref(),
        &provider,
        &config.embedding_model,
        &config.knowledge,
    )
    .await?;
    info!(backend = knowledge.name(), chunks = chunk_count, "Knowledge index ready");

    let sessions = helpdesk_sessions::build_from_config(&config.sessions);
    let metrics = Arc::new(helpdesk_metrics::build_from_config(&config.metrics));

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let service =
        ConversationService::new(&config, provider, knowledge, sessions, metrics, prompts);

    let app = build_router(Arc::new(AppState { service }));

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| Error::Internal(format!("Failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Error::Internal(format!("Server error: {e}")))?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Omitted on the first message; the reply carries the assigned ID
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    let session_id = match payload.session_id {
        Some(id) if !id.trim().is_empty() => SessionId(id),
        _ => SessionId::new(),
    };

    match state.service.handle_message(&session_id, &payload.message).await {
        Ok(response) => Ok(Json(ChatResponse {
            session_id: session_id.0,
            response,
        })),
        // Rejections are the only errors the service surfaces
        Err(e) => Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

async fn metrics_handler(State(state): State<SharedState>) -> Json<helpdesk_metrics::MetricsSummary> {
    Json(state.service.metrics().summary().await)
}

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

async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "The path you requested doesn't exist.".into(),
        }),
    )
}
