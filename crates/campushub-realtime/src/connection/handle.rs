//! Individual WebSocket connection handle.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::warn;

use campushub_core::types::{ConnectionId, SessionId, UserId};

use crate::event::ServerEvent;

/// The authenticated identity bound to a connection.
///
/// Set exactly once on a successful connect; the user id is immutable
/// for the connection's lifetime.
#[derive(Debug, Clone)]
pub struct SessionIdentity {
    /// The presence store session this connection registered.
    pub session_id: SessionId,
    /// The authenticated user.
    pub user_id: UserId,
    /// Username snapshot taken at connect time.
    pub username: String,
    /// Avatar reference snapshot taken at connect time.
    pub avatar_ref: Option<String>,
}

/// A handle to a single WebSocket connection.
///
/// Holds the sender for the outbound forwarder task plus the identity
/// bound at authentication time. A connection id is never reused; a
/// reconnect creates a new handle.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection id.
    pub id: ConnectionId,
    /// Identity, set once on successful authentication.
    identity: OnceLock<SessionIdentity>,
    /// Sender feeding the outbound forwarder task.
    sender: mpsc::Sender<ServerEvent>,
    /// When the transport connection was established.
    pub connected_at: DateTime<Utc>,
    /// Whether the connection is still alive.
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Creates a handle for a freshly accepted, unauthenticated
    /// connection.
    pub fn new(sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            id: ConnectionId::new(),
            identity: OnceLock::new(),
            sender,
            connected_at: Utc::now(),
            alive: AtomicBool::new(true),
        }
    }

    /// Binds the authenticated identity. Returns `false` if the
    /// connection was already authenticated.
    pub fn bind_identity(&self, identity: SessionIdentity) -> bool {
        self.identity.set(identity).is_ok()
    }

    /// The bound identity, if the connection has authenticated.
    pub fn identity(&self) -> Option<&SessionIdentity> {
        self.identity.get()
    }

    /// Queues an event for delivery to this connection.
    ///
    /// Fire-and-forget: a full buffer drops the event (slow consumer), a
    /// closed channel marks the connection dead. Returns whether the
    /// event was queued.
    pub fn send(&self, event: ServerEvent) -> bool {
        if !self.is_alive() {
            return false;
        }
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!(conn_id = %self.id, "Send buffer full, dropping event");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                false
            }
        }
    }

    /// Whether the connection is still alive.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Marks the connection as dead. Idempotent.
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }
}
