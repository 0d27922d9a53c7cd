//! Axum router configuration with middleware.
//!
//! Chat routes live under `/api/v1/chat`; `/` and `/health` sit at the root.
//! Middleware: CORS (origins from config), tracing.

use axum::Router;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.server.cors_origins);

    Router::new()
        .route("/api/v1/chat", post(handlers::chat::chat))
        .route("/api/v1/chat/health", get(handlers::health::chat_health))
        .route(
            "/api/v1/chat/sessions/{id}",
            get(handlers::session::get_session).delete(handlers::session::clear_session),
        )
        .route(
            "/api/v1/chat/sessions/{id}/history",
            get(handlers::session::get_history),
        )
        .route("/health", get(handlers::health::health))
        .route("/", get(handlers::health::index))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins. `"*"` allows any origin; unparsable
/// entries are skipped.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(origin = %origin, error = %e, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    base.allow_origin(AllowOrigin::list(parsed))
}
