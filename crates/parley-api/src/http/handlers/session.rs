//! Session HTTP handlers.
//!
//! Endpoints:
//! - GET    /api/v1/chat/sessions/{id}/history - Visible conversation history
//! - GET    /api/v1/chat/sessions/{id}         - Session summary
//! - DELETE /api/v1/chat/sessions/{id}         - Clear a session

use axum::Json;
use axum::extract::{Path, State};
use serde::Serialize;

use parley_types::chat::{HistoryEntry, SessionInfo};

use crate::http::error::AppError;
use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub session_id: String,
    pub history: Vec<HistoryEntry>,
    pub message_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub message: String,
}

/// GET /api/v1/chat/sessions/{id}/history - Human and AI messages in order.
///
/// Unknown sessions yield an empty history, not an error.
pub async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ApiResponse<HistoryResponse>> {
    let clock = RequestClock::start();

    let history = state.agent.get_history(&session_id).await;
    let self_link = format!("/api/v1/chat/sessions/{session_id}/history");
    let data = HistoryResponse {
        message_count: history.len(),
        history,
        session_id,
    };

    Json(ApiResponse::success(data, &clock).with_link("self", &self_link))
}

/// GET /api/v1/chat/sessions/{id} - Session summary.
pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionInfo>>, AppError> {
    let clock = RequestClock::start();

    let info = state
        .agent
        .get_session_info(&session_id)
        .await
        .ok_or_else(|| AppError::SessionNotFound(session_id.clone()))?;

    let history_link = format!("/api/v1/chat/sessions/{session_id}/history");
    Ok(Json(
        ApiResponse::success(info, &clock)
            .with_link("self", &format!("/api/v1/chat/sessions/{session_id}"))
            .with_link("history", &history_link),
    ))
}

/// DELETE /api/v1/chat/sessions/{id} - Clear a session. Idempotent.
pub async fn clear_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Json<ApiResponse<ClearResponse>> {
    let clock = RequestClock::start();

    let agent = state.agent.clone();
    state
        .session_locks
        .with_lock(&session_id, agent.clear_session(&session_id))
        .await;

    Json(ApiResponse::success(
        ClearResponse {
            message: format!("Session {session_id} cleared successfully"),
        },
        &clock,
    ))
}
