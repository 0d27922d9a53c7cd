//! Health and index endpoints.
//!
//! - GET /                    - Application name, version, endpoint index
//! - GET /health              - Liveness plus LLM configuration state
//! - GET /api/v1/chat/health  - Chat service detail

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::http::response::{ApiResponse, RequestClock};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct LlmConfigStatus {
    pub current_provider: String,
    pub available_providers: Vec<String>,
    pub provider_configured: bool,
    pub missing_config: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatHealth {
    pub status: &'static str,
    pub service: &'static str,
    pub agent_initialized: bool,
    pub llm_config: LlmConfigStatus,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    pub version: &'static str,
    pub llm: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Index {
    pub name: &'static str,
    pub version: &'static str,
    pub endpoints: Vec<EndpointInfo>,
}

#[derive(Debug, Serialize)]
pub struct EndpointInfo {
    pub method: &'static str,
    pub path: &'static str,
}

/// GET /api/v1/chat/health - Agent and backend configuration state.
pub async fn chat_health(State(state): State<AppState>) -> Json<ApiResponse<ChatHealth>> {
    let clock = RequestClock::start();

    let data = ChatHealth {
        status: "healthy",
        service: "chat",
        agent_initialized: state.agent.is_initialized(),
        llm_config: LlmConfigStatus {
            current_provider: state.llm_status.provider.clone(),
            available_providers: state
                .available_providers
                .iter()
                .map(|k| k.to_string())
                .collect(),
            provider_configured: state.llm_status.configured,
            missing_config: state.llm_status.missing.clone(),
        },
        active_sessions: state.active_sessions(),
    };

    Json(ApiResponse::success(data, &clock))
}

/// GET /health - Liveness check.
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<ServiceHealth>> {
    let clock = RequestClock::start();

    let live = state.agent.model().is_some_and(|m| m.is_live());
    Json(ApiResponse::success(
        ServiceHealth {
            status: "healthy",
            version: env!("CARGO_PKG_VERSION"),
            llm: if live { "configured" } else { "not_configured" },
        },
        &clock,
    ))
}

/// GET / - Application index.
pub async fn index() -> Json<ApiResponse<Index>> {
    let clock = RequestClock::start();

    let endpoints = vec![
        EndpointInfo { method: "POST", path: "/api/v1/chat" },
        EndpointInfo { method: "GET", path: "/api/v1/chat/sessions/{session_id}/history" },
        EndpointInfo { method: "GET", path: "/api/v1/chat/sessions/{session_id}" },
        EndpointInfo { method: "DELETE", path: "/api/v1/chat/sessions/{session_id}" },
        EndpointInfo { method: "GET", path: "/api/v1/chat/health" },
        EndpointInfo { method: "GET", path: "/health" },
    ];

    Json(ApiResponse::success(
        Index {
            name: "Parley",
            version: env!("CARGO_PKG_VERSION"),
            endpoints,
        },
        &clock,
    ))
}
