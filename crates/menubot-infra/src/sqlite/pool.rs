//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows one writer at a time. The writer pool is pinned to a
//! single connection so every write (including the transactional turn
//! sequence assignment) is serialized; the reader pool fans out to
//! several read-only connections for concurrent history queries.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

/// Split read/write pool for SQLite with WAL mode.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Open (creating if missing) and migrate the database.
    ///
    /// Migrations run on the writer before the reader pool opens, so a
    /// fresh database is fully initialized before the first query.
    /// Schema setup is idempotent: rerunning against an initialized
    /// store is a no-op.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(base_opts)
            .await?;

        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        Ok(Self { reader, writer })
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::test_pool;

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let (_dir, pool) = test_pool().await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(names, vec!["sessions", "turns", "users"]);
    }

    #[tokio::test]
    async fn test_pool_wal_and_foreign_keys() {
        let (_dir, pool) = test_pool().await;

        let journal: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(journal.0.to_lowercase(), "wal");

        let fk: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();
        assert_eq!(fk.0, 1);
    }

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("twice.db").display()
        );
        let first = super::DatabasePool::new(&url).await.unwrap();
        drop(first);
        // Reopening an initialized store must succeed.
        super::DatabasePool::new(&url).await.unwrap();
    }
}
