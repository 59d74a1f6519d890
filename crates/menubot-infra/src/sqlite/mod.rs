//! SQLite repository implementations.

pub mod history;
pub mod identity;
pub mod pool;
pub mod session;

use menubot_types::error::StorageError;

/// Classify a sqlx error into the storage taxonomy.
///
/// Pool and I/O failures mean the backend is unreachable; unique
/// violations become conflicts (callers decide whether a conflict is a
/// race to resolve or a real error); everything else is a query error.
pub(crate) fn map_sqlx_err(e: sqlx::Error) -> StorageError {
    if e.as_database_error()
        .map(|d| d.is_unique_violation())
        .unwrap_or(false)
    {
        return StorageError::Conflict(e.to_string());
    }
    match &e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(e.to_string())
        }
        _ => StorageError::Query(e.to_string()),
    }
}

pub(crate) fn parse_datetime(
    s: &str,
) -> Result<chrono::DateTime<chrono::Utc>, StorageError> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| StorageError::Query(format!("invalid datetime: {e}")))
}

pub(crate) fn format_datetime(dt: &chrono::DateTime<chrono::Utc>) -> String {
    dt.to_rfc3339()
}
