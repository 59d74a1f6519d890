//! Chat session and conversation turn types.
//!
//! A [`Session`] is a durable continuity token binding an ordered sequence
//! of [`Turn`]s to one user. Turns are immutable once written; their order
//! within a session is fixed by a monotonic sequence number assigned at
//! insert time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Who produced a turn.
///
/// Maps to the CHECK constraint in the SQLite schema:
/// `CHECK (role IN ('human', 'ai'))`. The wire form is the same
/// lowercase string pair exposed by the history endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Human,
    Ai,
}

impl fmt::Display for TurnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TurnRole::Human => write!(f, "human"),
            TurnRole::Ai => write!(f, "ai"),
        }
    }
}

impl FromStr for TurnRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(TurnRole::Human),
            "ai" => Ok(TurnRole::Ai),
            other => Err(format!("invalid turn role: '{other}'")),
        }
    }
}

/// A chat session owned by a single user.
///
/// The id is a random 128-bit UUID, either client-supplied or generated
/// by the session resolver. Once created, the user binding never changes
/// and the session is never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

/// One immutable message in a session's ordered history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Row id assigned by the storage layer.
    pub id: i64,
    pub session_id: Uuid,
    pub role: TurnRole,
    pub content: String,
    /// Per-session monotonic sequence number, assigned transactionally.
    pub seq: i64,
    pub created_at: DateTime<Utc>,
}
