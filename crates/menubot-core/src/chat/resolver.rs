//! Session resolution: the single entry point turning an inbound
//! (username, optional session id) pair into a confirmed session id.
//!
//! Composes the identity store and session registry. Called exactly once
//! per chat request, before any model interaction; its result is
//! authoritative for the rest of the request.

use chrono::Utc;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use menubot_types::chat::Session;
use menubot_types::error::{ChatError, StorageError};

use super::repository::{IdentityRepository, SessionRepository};

/// Resolves requests to a persisted session, creating identity and
/// session records as needed (idempotent get-or-create).
pub struct SessionResolver<I, S> {
    identity: Arc<I>,
    sessions: Arc<S>,
}

impl<I: IdentityRepository, S: SessionRepository> SessionResolver<I, S> {
    pub fn new(identity: Arc<I>, sessions: Arc<S>) -> Self {
        Self { identity, sessions }
    }

    /// Produce a valid, persisted session id for the request.
    ///
    /// - No requested id: generate a fresh UUID v4 and persist a session
    ///   bound to the resolved user.
    /// - Requested id with no record: persist a session under that id.
    /// - Requested id with an existing record: the stored user binding
    ///   wins; a caller whose resolved identity differs is rejected with
    ///   [`ChatError::SessionForbidden`] rather than silently reading
    ///   another user's conversation.
    pub async fn validate_session(
        &self,
        username: &str,
        requested_id: Option<Uuid>,
    ) -> Result<Uuid, ChatError> {
        let user = self.identity.ensure_user(username).await?;

        match requested_id {
            None => {
                let session = Session {
                    id: Uuid::new_v4(),
                    user_id: user.id,
                    created_at: Utc::now(),
                };
                match self.sessions.insert(&session).await {
                    Ok(()) => {}
                    // Random-id collision. Negligible probability, one retry.
                    Err(StorageError::Conflict(_)) => {
                        let retry = Session {
                            id: Uuid::new_v4(),
                            ..session
                        };
                        self.sessions.insert(&retry).await?;
                        return Ok(retry.id);
                    }
                    Err(e) => return Err(e.into()),
                }
                info!(session_id = %session.id, username, "created session");
                Ok(session.id)
            }
            Some(id) => match self.sessions.get(&id).await? {
                Some(existing) if existing.user_id == user.id => Ok(id),
                Some(_) => Err(ChatError::SessionForbidden),
                None => {
                    let session = Session {
                        id,
                        user_id: user.id,
                        created_at: Utc::now(),
                    };
                    match self.sessions.insert(&session).await {
                        Ok(()) => {
                            info!(session_id = %id, username, "recorded client-supplied session");
                            Ok(id)
                        }
                        // Lost a concurrent create of the same id: re-read
                        // and apply the ownership check to the winner.
                        Err(StorageError::Conflict(_)) => {
                            match self.sessions.get(&id).await? {
                                Some(winner) if winner.user_id == user.id => Ok(id),
                                Some(_) => Err(ChatError::SessionForbidden),
                                None => Err(ChatError::SessionNotFound),
                            }
                        }
                        Err(e) => Err(e.into()),
                    }
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::testing::{MemoryIdentityRepository, MemorySessionRepository};

    fn resolver() -> SessionResolver<MemoryIdentityRepository, MemorySessionRepository> {
        SessionResolver::new(
            Arc::new(MemoryIdentityRepository::default()),
            Arc::new(MemorySessionRepository::default()),
        )
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let repo = MemoryIdentityRepository::default();
        use crate::chat::repository::IdentityRepository;
        let first = repo.ensure_user("alice").await.unwrap();
        let second = repo.ensure_user("alice").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_fresh_sessions_get_distinct_ids() {
        let resolver = resolver();
        let a = resolver.validate_session("alice", None).await.unwrap();
        let b = resolver.validate_session("alice", None).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_existing_session_id_is_returned_unchanged() {
        let resolver = resolver();
        let id = resolver.validate_session("alice", None).await.unwrap();
        let again = resolver.validate_session("alice", Some(id)).await.unwrap();
        assert_eq!(id, again);
    }

    #[tokio::test]
    async fn test_client_supplied_id_is_persisted() {
        let resolver = resolver();
        let id = Uuid::new_v4();
        let confirmed = resolver.validate_session("alice", Some(id)).await.unwrap();
        assert_eq!(confirmed, id);
        // A second request with the same id continues the same session.
        let again = resolver.validate_session("alice", Some(id)).await.unwrap();
        assert_eq!(again, id);
    }

    #[tokio::test]
    async fn test_foreign_session_is_forbidden() {
        let resolver = resolver();
        let id = resolver.validate_session("alice", None).await.unwrap();
        let err = resolver
            .validate_session("mallory", Some(id))
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SessionForbidden));
    }

    #[tokio::test]
    async fn test_binding_survives_foreign_attempt() {
        let resolver = resolver();
        let id = resolver.validate_session("alice", None).await.unwrap();
        let _ = resolver.validate_session("mallory", Some(id)).await;
        // Alice still owns the session.
        let again = resolver.validate_session("alice", Some(id)).await.unwrap();
        assert_eq!(again, id);
    }
}
