//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`; `/health` is unauthenticated.
//! Middleware: permissive CORS, request tracing.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use menubot_core::llm::provider::LlmProvider;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router.
pub fn build_router<P: LlmProvider + 'static>(state: AppState<P>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route("/chat", post(handlers::chat::chat::<P>))
        .route("/sessions/{id}", get(handlers::session::get_history::<P>));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health — liveness probe (no auth required).
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
