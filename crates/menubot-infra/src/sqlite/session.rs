//! SQLite session registry.

use sqlx::Row;
use uuid::Uuid;

use menubot_core::chat::repository::SessionRepository;
use menubot_types::chat::Session;
use menubot_types::error::StorageError;

use super::{format_datetime, map_sqlx_err, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn session_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Session, StorageError> {
    let id: String = row.try_get("id").map_err(map_sqlx_err)?;
    let user_id: i64 = row.try_get("user_id").map_err(map_sqlx_err)?;
    let created_at: String = row.try_get("created_at").map_err(map_sqlx_err)?;

    Ok(Session {
        id: Uuid::parse_str(&id)
            .map_err(|e| StorageError::Query(format!("invalid session id: {e}")))?,
        user_id,
        created_at: parse_datetime(&created_at)?,
    })
}

impl SessionRepository for SqliteSessionRepository {
    async fn get(&self, session_id: &Uuid) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT id, user_id, created_at FROM sessions WHERE id = ?")
            .bind(session_id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(map_sqlx_err)?;

        row.as_ref().map(session_from_row).transpose()
    }

    async fn insert(&self, session: &Session) -> Result<(), StorageError> {
        sqlx::query("INSERT INTO sessions (id, user_id, created_at) VALUES (?, ?, ?)")
            .bind(session.id.to_string())
            .bind(session.user_id)
            .bind(format_datetime(&session.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err)?;
        Ok(())
    }
}
