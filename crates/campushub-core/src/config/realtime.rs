//! Real-time WebSocket engine configuration.

use serde::{Deserialize, Serialize};

/// Real-time (WebSocket) engine configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealtimeConfig {
    /// Internal buffer size for per-connection outbound queues.
    #[serde(default = "default_channel_buffer")]
    pub channel_buffer_size: usize,
    /// Maximum WebSocket connections per user.
    #[serde(default = "default_max_connections_per_user")]
    pub max_connections_per_user: usize,
    /// Maximum message content length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            channel_buffer_size: default_channel_buffer(),
            max_connections_per_user: default_max_connections_per_user(),
            max_message_length: default_max_message_length(),
        }
    }
}

fn default_channel_buffer() -> usize {
    256
}

fn default_max_connections_per_user() -> usize {
    8
}

fn default_max_message_length() -> usize {
    4096
}
