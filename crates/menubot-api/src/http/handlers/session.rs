//! Session history endpoint.
//!
//! GET /api/v1/sessions/{id}
//!
//! The id must be a syntactically valid UUID (rejected with 400 before
//! any storage access) and must reference an existing session (404
//! otherwise). A well-formed id is treated as a capability token: the
//! chat endpoint is where ownership is enforced.

use std::time::Instant;

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use menubot_core::chat::repository::{HistoryRepository, SessionRepository};
use menubot_core::llm::provider::LlmProvider;
use menubot_types::chat::TurnRole;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// One turn as exposed by the history endpoint.
#[derive(Debug, Serialize)]
pub struct HistoryEntry {
    pub role: TurnRole,
    pub content: String,
}

/// History payload for a session.
#[derive(Debug, Serialize)]
pub struct SessionHistory {
    pub session_id: Uuid,
    pub messages: Vec<HistoryEntry>,
}

/// GET /api/v1/sessions/{id} — full ordered history.
pub async fn get_history<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    _auth: Authenticated,
    Path(session_id): Path<String>,
) -> Result<Json<ApiResponse<SessionHistory>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::new_v4().to_string();

    let sid: Uuid = session_id
        .parse()
        .map_err(|_| AppError::Validation("Invalid session ID format".to_string()))?;

    state
        .sessions
        .get(&sid)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found".to_string()))?;

    let turns = state.history.list(&sid).await?;
    let messages = turns
        .into_iter()
        .map(|t| HistoryEntry {
            role: t.role,
            content: t.content,
        })
        .collect();

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        SessionHistory {
            session_id: sid,
            messages,
        },
        request_id,
        elapsed,
    )))
}
