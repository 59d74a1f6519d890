//! Streaming chat endpoint.
//!
//! POST /api/v1/chat
//!
//! Validates the request, resolves it to a persisted session, then
//! streams the model's reply as a plain-text body. The confirmed
//! session id travels in the `x-session-id` response header so a client
//! without a prior session learns the newly created one.

use axum::body::Body;
use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use menubot_core::llm::provider::LlmProvider;

use crate::http::error::AppError;
use crate::http::extractors::auth::Authenticated;
use crate::state::AppState;

/// Request body for the chat endpoint.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub username: String,
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

/// Reject malformed input before any resolver or orchestrator work.
pub(crate) fn validate(request: &ChatRequest) -> Result<Option<Uuid>, AppError> {
    if request.username.is_empty()
        || !request.username.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return Err(AppError::Validation(
            "username must be nonempty and alphanumeric".to_string(),
        ));
    }
    if request.message.chars().count() < 2 {
        return Err(AppError::Validation(
            "message must be at least 2 characters".to_string(),
        ));
    }
    match &request.session_id {
        None => Ok(None),
        Some(raw) => raw
            .parse::<Uuid>()
            .map(Some)
            .map_err(|_| AppError::Validation("session_id must be a valid UUID".to_string())),
    }
}

/// POST /api/v1/chat — stream a reply.
pub async fn chat<P: LlmProvider + 'static>(
    State(state): State<AppState<P>>,
    _auth: Authenticated,
    Json(body): Json<ChatRequest>,
) -> Result<Response, AppError> {
    let requested_id = validate(&body)?;

    let session_id = state
        .resolver
        .validate_session(&body.username, requested_id)
        .await?;

    let stream = state
        .chat_service
        .stream(session_id, body.message, body.username, body.location)
        .await?;

    let response = Response::builder()
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .header("x-session-id", session_id.to_string())
        .body(Body::from_stream(stream))
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(response)
}
