//! HTTP chat front end for calclaw.
//!
//! Exposes a health check and the v1 API (chat, starters, tool catalog)
//! over a shared [`AgentLoop`]. Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use calclaw_agent::AgentLoop;

/// Request body limit for every route.
const BODY_LIMIT_BYTES: usize = 64 * 1024;

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// - CORS limited to the local dev origin
/// - Request body size limit
/// - HTTP trace logging
pub fn build_router(agent: Arc<AgentLoop>) -> Router {
    let v1 = api_v1::v1_router(Arc::new(api_v1::ApiV1State { agent }));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://localhost:8080",
        )))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", v1)
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Serve the gateway until the process is stopped.
pub async fn start(
    agent: Arc<AgentLoop>,
    host: &str,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{host}:{port}");
    let app = build_router(agent);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
