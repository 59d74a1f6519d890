//! Error taxonomy shared across the workspace.

use thiserror::Error;

use crate::llm::LlmError;

/// Errors from persistence operations.
///
/// Lower layers never swallow these; they propagate up to the API layer,
/// which maps them to server-error responses. Retries, if any, belong to
/// the storage backend, not to callers.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached (pool exhausted, I/O failure).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A query failed or returned malformed data.
    #[error("query error: {0}")]
    Query(String),

    /// A uniqueness constraint rejected a write.
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors from the chat domain: session resolution and response streaming.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("session not found")]
    SessionNotFound,

    /// The session exists but is bound to a different user.
    #[error("session belongs to another user")]
    SessionForbidden,

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The model collaborator failed before producing any output.
    #[error("generation failed: {0}")]
    Generation(#[from] LlmError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Unavailable("pool timed out".to_string());
        assert_eq!(err.to_string(), "storage unavailable: pool timed out");
    }

    #[test]
    fn test_chat_error_from_storage() {
        let err: ChatError = StorageError::Query("syntax error".to_string()).into();
        assert!(matches!(err, ChatError::Storage(_)));
    }

    #[test]
    fn test_chat_error_from_llm() {
        let err: ChatError = LlmError::Timeout(30).into();
        assert!(err.to_string().contains("generation failed"));
    }
}
