//! Presence store TTL configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// TTL and sweep settings for ephemeral presence state.
///
/// TTL expiry is the correctness backstop for crashed or abandoned
/// connections: a session that vanishes without a clean disconnect stops
/// counting as online once its keys expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Session and online-flag TTL in seconds. Refreshed on activity.
    #[serde(default = "default_session_ttl")]
    pub session_ttl_seconds: u64,
    /// Conversation room membership TTL in seconds.
    #[serde(default = "default_room_ttl")]
    pub room_ttl_seconds: u64,
    /// Typing indicator TTL in seconds.
    #[serde(default = "default_typing_ttl")]
    pub typing_ttl_seconds: u64,
    /// Message read-through cache TTL in seconds.
    #[serde(default = "default_message_cache_ttl")]
    pub message_cache_ttl_seconds: u64,
    /// Interval between presence reconciliation sweeps in seconds.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_seconds: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            session_ttl_seconds: default_session_ttl(),
            room_ttl_seconds: default_room_ttl(),
            typing_ttl_seconds: default_typing_ttl(),
            message_cache_ttl_seconds: default_message_cache_ttl(),
            sweep_interval_seconds: default_sweep_interval(),
        }
    }
}

impl PresenceConfig {
    /// Session TTL as a [`Duration`].
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_seconds)
    }

    /// Room membership TTL as a [`Duration`].
    pub fn room_ttl(&self) -> Duration {
        Duration::from_secs(self.room_ttl_seconds)
    }

    /// Typing flag TTL as a [`Duration`].
    pub fn typing_ttl(&self) -> Duration {
        Duration::from_secs(self.typing_ttl_seconds)
    }

    /// Message cache TTL as a [`Duration`].
    pub fn message_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.message_cache_ttl_seconds)
    }

    /// Reconciliation sweep interval as a [`Duration`].
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds)
    }
}

fn default_session_ttl() -> u64 {
    1800
}

fn default_room_ttl() -> u64 {
    3600
}

fn default_typing_ttl() -> u64 {
    10
}

fn default_message_cache_ttl() -> u64 {
    300
}

fn default_sweep_interval() -> u64 {
    60
}
