//! SQLite history ledger.
//!
//! Appends run inside a transaction on the single-connection writer
//! pool: the next per-session sequence number is read and the turn
//! inserted atomically, so appends from concurrent requests serialize
//! with strict ordering.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use menubot_core::chat::repository::HistoryRepository;
use menubot_types::chat::{Turn, TurnRole};
use menubot_types::error::StorageError;

use super::{format_datetime, map_sqlx_err, parse_datetime};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `HistoryRepository`.
pub struct SqliteHistoryRepository {
    pool: DatabasePool,
}

impl SqliteHistoryRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn turn_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Turn, StorageError> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_err)?;
    let session_id: String = row.try_get("session_id").map_err(map_sqlx_err)?;
    let role: String = row.try_get("role").map_err(map_sqlx_err)?;
    let content: String = row.try_get("content").map_err(map_sqlx_err)?;
    let seq: i64 = row.try_get("seq").map_err(map_sqlx_err)?;
    let created_at: String = row.try_get("created_at").map_err(map_sqlx_err)?;

    Ok(Turn {
        id,
        session_id: Uuid::parse_str(&session_id)
            .map_err(|e| StorageError::Query(format!("invalid session id: {e}")))?,
        role: role.parse().map_err(StorageError::Query)?,
        content,
        seq,
        created_at: parse_datetime(&created_at)?,
    })
}

impl HistoryRepository for SqliteHistoryRepository {
    async fn append(
        &self,
        session_id: &Uuid,
        role: TurnRole,
        content: &str,
    ) -> Result<Turn, StorageError> {
        let mut tx = self.pool.writer.begin().await.map_err(map_sqlx_err)?;

        let seq: i64 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM turns WHERE session_id = ?",
        )
        .bind(session_id.to_string())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        let created_at = Utc::now();
        let done = sqlx::query(
            "INSERT INTO turns (session_id, seq, role, content, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(session_id.to_string())
        .bind(seq)
        .bind(role.to_string())
        .bind(content)
        .bind(format_datetime(&created_at))
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_err)?;

        tx.commit().await.map_err(map_sqlx_err)?;

        Ok(Turn {
            id: done.last_insert_rowid(),
            session_id: *session_id,
            role,
            content: content.to_string(),
            seq,
            created_at,
        })
    }

    async fn list(&self, session_id: &Uuid) -> Result<Vec<Turn>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, session_id, seq, role, content, created_at
             FROM turns WHERE session_id = ? ORDER BY seq ASC",
        )
        .bind(session_id.to_string())
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter().map(turn_from_row).collect()
    }

    async fn tail(&self, session_id: &Uuid, limit: u32) -> Result<Vec<Turn>, StorageError> {
        let rows = sqlx::query(
            "SELECT * FROM (
                 SELECT id, session_id, seq, role, content, created_at
                 FROM turns WHERE session_id = ? ORDER BY seq DESC LIMIT ?
             ) ORDER BY seq ASC",
        )
        .bind(session_id.to_string())
        .bind(limit as i64)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(map_sqlx_err)?;

        rows.iter().map(turn_from_row).collect()
    }
}
