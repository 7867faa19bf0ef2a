//! HTTP API v1 for the calendar assistant.
//!
//! Endpoints:
//!
//! - `POST /v1/chat`     : Send a message, get the assistant's reply
//! - `GET  /v1/starters` : Suggested opening messages
//! - `GET  /v1/tools`    : List the tools the assistant can call

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use calclaw_agent::AgentLoop;
use calclaw_core::message::SessionId;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
pub struct ApiV1State {
    pub agent: Arc<AgentLoop>,
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/starters", get(starters_handler))
        .route("/tools", get(list_tools_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Deserialize)]
pub struct ChatRequest {
    /// Existing session (omit to start a new one).
    #[serde(default)]
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Starter {
    pub label: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StarterListResponse {
    pub starters: Vec<Starter>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolDto {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<ToolDto>,
    pub count: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// The conversation starters offered by the chat UI.
pub fn starters() -> Vec<Starter> {
    [
        (
            "Schedule an event",
            "Could you help me schedule an event three days from now?",
        ),
        (
            "Tomorrow's agenda",
            "I need to know what appointments I have tomorrow.",
        ),
        (
            "Check availability at 15:00",
            "Next week, which days am I free for a meeting at 15:00?",
        ),
    ]
    .into_iter()
    .map(|(label, message)| Starter {
        label: label.into(),
        message: message.into(),
    })
    .collect()
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedApiState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorResponse>)> {
    if payload.message.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "message must not be empty".into(),
            }),
        ));
    }

    let session = payload
        .session_id
        .filter(|id| !id.trim().is_empty())
        .map(SessionId::from)
        .unwrap_or_default();
    info!(session_id = %session, message_len = payload.message.len(), "v1/chat request");

    let reply = state.agent.respond(&session, &payload.message).await;
    Ok(Json(ChatResponse {
        session_id: session.to_string(),
        reply,
    }))
}

async fn starters_handler() -> Json<StarterListResponse> {
    Json(StarterListResponse {
        starters: starters(),
    })
}

async fn list_tools_handler(State(state): State<SharedApiState>) -> Json<ToolListResponse> {
    let defs = state.agent.tools().definitions();
    let count = defs.len();

    Json(ToolListResponse {
        tools: defs
            .into_iter()
            .map(|d| ToolDto {
                name: d.name,
                description: d.description,
                parameters: d.parameters,
            })
            .collect(),
        count,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────
