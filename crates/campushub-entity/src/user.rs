//! Public user profile projection.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use campushub_core::types::UserId;

/// The public projection of a user record.
///
/// The full account entity (credentials, settings, follow graph) lives in
/// the user service; the messaging backend only ever sees this projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Unique user identifier.
    pub id: UserId,
    /// Unique username.
    pub username: String,
    /// Reference to the user's avatar in object storage, if set.
    pub avatar_ref: Option<String>,
}
