//! User identity types.

use serde::{Deserialize, Serialize};

/// A durable user record, keyed by a unique username.
///
/// Identities are created lazily on the first message from a new
/// username and are never mutated or deleted afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Row id assigned by the storage layer.
    pub id: i64,
    pub username: String,
}
