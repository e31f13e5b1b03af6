//! Presence status value objects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use campushub_core::types::UserId;

/// Online/offline status derived from a user's live session set.
///
/// A user is online iff at least one non-expired session exists. The
/// status may lag the session set by the TTL refresh interval; that
/// bounded staleness is accepted by design.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    /// At least one live session.
    Online,
    /// No live sessions remain.
    Offline,
}

impl UserStatus {
    /// Stable string form used in wire events.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Online => "online",
            Self::Offline => "offline",
        }
    }
}

/// A point-in-time status change, broadcast to a user's contacts channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChange {
    /// The user whose status changed.
    pub user_id: UserId,
    /// Username snapshot for display.
    pub username: String,
    /// New status.
    pub status: UserStatus,
    /// When the transition was observed.
    pub timestamp: DateTime<Utc>,
}
