//! SQLite identity store.

use chrono::Utc;

use menubot_core::chat::repository::IdentityRepository;
use menubot_types::error::StorageError;
use menubot_types::identity::UserIdentity;

use super::{format_datetime, map_sqlx_err};
use super::pool::DatabasePool;

/// SQLite-backed implementation of `IdentityRepository`.
pub struct SqliteIdentityRepository {
    pool: DatabasePool,
}

impl SqliteIdentityRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    async fn find(&self, username: &str) -> Result<Option<UserIdentity>, StorageError> {
        let row: Option<(i64, String)> =
            sqlx::query_as("SELECT id, username FROM users WHERE username = ?")
                .bind(username)
                .fetch_optional(&self.pool.reader)
                .await
                .map_err(map_sqlx_err)?;
        Ok(row.map(|(id, username)| UserIdentity { id, username }))
    }
}

impl IdentityRepository for SqliteIdentityRepository {
    async fn ensure_user(&self, username: &str) -> Result<UserIdentity, StorageError> {
        if let Some(user) = self.find(username).await? {
            return Ok(user);
        }

        let result = sqlx::query("INSERT INTO users (username, created_at) VALUES (?, ?)")
            .bind(username)
            .bind(format_datetime(&Utc::now()))
            .execute(&self.pool.writer)
            .await
            .map_err(map_sqlx_err);

        match result {
            Ok(done) => Ok(UserIdentity {
                id: done.last_insert_rowid(),
                username: username.to_string(),
            }),
            // Lost a concurrent first-time creation: the UNIQUE
            // constraint rejected us, so the winner's record exists.
            Err(StorageError::Conflict(_)) => self.find(username).await?.ok_or_else(|| {
                StorageError::Query(format!("user '{username}' vanished after conflict"))
            }),
            Err(e) => Err(e),
        }
    }
}
