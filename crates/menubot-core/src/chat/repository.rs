//! Repository trait definitions for identities, sessions, and history.
//!
//! Implementations live in menubot-infra (e.g. `SqliteHistoryRepository`).
//! Uses native async fn in traits (RPITIT, Rust 2024 edition).

use menubot_types::chat::{Session, Turn, TurnRole};
use menubot_types::error::StorageError;
use menubot_types::identity::UserIdentity;
use uuid::Uuid;

/// Durable mapping of usernames to stable user records.
pub trait IdentityRepository: Send + Sync {
    /// Look up a user by username, creating the record if absent.
    ///
    /// Idempotent: repeated calls with the same username return the same
    /// identity. A duplicate-insert race must resolve to the single
    /// surviving record (the loser re-reads the winner's row) rather
    /// than surfacing the conflict.
    fn ensure_user(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<UserIdentity, StorageError>> + Send;
}

/// Durable mapping of session ids to (user, creation) records.
pub trait SessionRepository: Send + Sync {
    /// Fetch a session by id.
    fn get(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<Session>, StorageError>> + Send;

    /// Persist a new session. Fails with `StorageError::Conflict` if a
    /// record for the id already exists.
    fn insert(
        &self,
        session: &Session,
    ) -> impl std::future::Future<Output = Result<(), StorageError>> + Send;
}

/// Append-only, session-scoped ordered log of turns.
pub trait HistoryRepository: Send + Sync {
    /// Append one immutable turn, assigning the next sequence number for
    /// the session transactionally.
    fn append(
        &self,
        session_id: &Uuid,
        role: TurnRole,
        content: &str,
    ) -> impl std::future::Future<Output = Result<Turn, StorageError>> + Send;

    /// All turns for a session in creation order, oldest first.
    ///
    /// An unknown session yields an empty vec, not an error.
    fn list(
        &self,
        session_id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, StorageError>> + Send;

    /// The last `limit` turns in chronological order. Used to build the
    /// bounded model context window.
    fn tail(
        &self,
        session_id: &Uuid,
        limit: u32,
    ) -> impl std::future::Future<Output = Result<Vec<Turn>, StorageError>> + Send;
}
