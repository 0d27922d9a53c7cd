//! Chat turn HTTP handler.
//!
//! Endpoint:
//! - POST /api/v1/chat - Run one turn, creating the session if needed

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use parley_core::pipeline::state::InvocationOutcome;

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

/// Longest accepted session id, in bytes.
pub const MAX_SESSION_ID_LEN: usize = 256;

fn default_user_type() -> String {
    "customer".to_string()
}

/// Request body for a chat turn.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    /// Continue this session; a new id is generated when absent.
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default = "default_user_type")]
    pub user_type: String,
}

/// Response payload for a chat turn.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
    pub user_type: String,
    pub is_new_session: bool,
    pub metadata: ChatMetadata,
}

#[derive(Debug, Serialize)]
pub struct ChatMetadata {
    pub message_length: usize,
    pub response_length: usize,
    pub processing_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<InvocationOutcome>,
}

/// Reject requests the agent should never see.
pub fn validate_request(req: &ChatRequest, max_message_length: usize) -> Result<(), AppError> {
    if req.message.is_empty() {
        return Err(AppError::Validation("Message cannot be empty".to_string()));
    }
    if req.message.chars().count() > max_message_length {
        return Err(AppError::Validation(format!(
            "Message too long (max {max_message_length} characters)"
        )));
    }
    if let Some(id) = &req.session_id {
        if id.len() > MAX_SESSION_ID_LEN {
            return Err(AppError::Validation(format!(
                "Session id too long (max {MAX_SESSION_ID_LEN} bytes)"
            )));
        }
    }
    Ok(())
}

/// POST /api/v1/chat - Run one conversational turn.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ApiResponse<ChatResponse>>, AppError> {
    let clock = RequestClock::start();

    validate_request(&req, state.config.server.max_message_length)?;
    if !state.agent.is_initialized() {
        return Err(AppError::Internal("Chat agent not initialized".to_string()));
    }

    let session_id = req
        .session_id
        .clone()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    info!(
        session_id = %session_id,
        user_type = %req.user_type,
        message_length = req.message.chars().count(),
        "chat request"
    );

    let agent = state.agent.clone();
    let report = state
        .session_locks
        .with_lock(&session_id, agent.turn_detailed(&req.message, &session_id, &req.user_type))
        .await;

    let data = ChatResponse {
        metadata: ChatMetadata {
            message_length: req.message.chars().count(),
            response_length: report.reply.chars().count(),
            processing_time_ms: clock.elapsed_ms(),
            outcome: report.outcome,
        },
        response: report.reply,
        session_id: report.session_id,
        user_type: req.user_type,
        is_new_session: report.is_new_session,
    };

    let history_link = format!("/api/v1/chat/sessions/{}/history", data.session_id);
    Ok(Json(
        ApiResponse::success(data, &clock)
            .with_link("self", "/api/v1/chat")
            .with_link("history", &history_link),
    ))
}
