//! Optional API key gate.
//!
//! When `server.api_key_enabled` is set, requests must carry the key
//! from the configured environment variable via `X-API-Key: <key>` or
//! `Authorization: Bearer <key>`. When disabled (the default), the
//! extractor is a no-op.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use menubot_core::llm::provider::LlmProvider;

use crate::http::error::AppError;
use crate::state::AppState;

/// Authenticated request marker. Extracting this enforces the key gate.
pub struct Authenticated;

impl<P: LlmProvider + 'static> FromRequestParts<AppState<P>> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<P>,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.server.api_key_enabled {
            return Ok(Authenticated);
        }

        let expected = std::env::var(&state.config.server.api_key_env).map_err(|_| {
            AppError::Internal(format!(
                "API key gate enabled but {} is not set",
                state.config.server.api_key_env
            ))
        })?;

        match extract_api_key(parts) {
            Some(provided) if provided == expected => Ok(Authenticated),
            _ => Err(AppError::Forbidden(
                "Invalid or missing API key".to_string(),
            )),
        }
    }
}

/// Pull the API key from request headers, if present.
fn extract_api_key(parts: &Parts) -> Option<String> {
    if let Some(auth) = parts.headers.get("authorization") {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(key) = auth_str.strip_prefix("Bearer ") {
                return Some(key.trim().to_string());
            }
        }
    }

    parts
        .headers
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.trim().to_string())
}
