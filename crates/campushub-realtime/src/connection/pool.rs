//! Connection pool indexed by connection id and user id.

use std::sync::Arc;

use dashmap::DashMap;

use campushub_core::types::{ConnectionId, UserId};

use super::handle::ConnectionHandle;
use crate::event::ServerEvent;

/// Thread-safe pool of this process's active WebSocket connections.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection id → handle, for direct lookup.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
    /// User id → handles; one user can hold several connections (tabs).
    by_user: DashMap<UserId, Vec<Arc<ConnectionHandle>>>,
}

impl ConnectionPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a freshly accepted connection.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Indexes an authenticated connection under its user. Called after
    /// the identity is bound.
    pub fn index_user(&self, handle: &Arc<ConnectionHandle>) {
        if let Some(identity) = handle.identity() {
            self.by_user
                .entry(identity.user_id)
                .or_default()
                .push(handle.clone());
        }
    }

    /// Removes a connection. Returns the handle if it was present.
    pub fn remove(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        let (_, handle) = self.by_id.remove(&conn_id)?;
        if let Some(identity) = handle.identity() {
            if let Some(mut connections) = self.by_user.get_mut(&identity.user_id) {
                connections.retain(|c| c.id != conn_id);
                let now_empty = connections.is_empty();
                drop(connections);
                if now_empty {
                    self.by_user
                        .remove_if(&identity.user_id, |_, connections| connections.is_empty());
                }
            }
        }
        Some(handle)
    }

    /// Looks up a connection by id.
    pub fn get(&self, conn_id: ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(&conn_id).map(|entry| entry.value().clone())
    }

    /// All live connections for a user in this process.
    pub fn user_connections(&self, user_id: UserId) -> Vec<Arc<ConnectionHandle>> {
        self.by_user
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Queues an event for every connection of a user.
    pub fn emit_to_user(&self, user_id: UserId, event: &ServerEvent) -> usize {
        self.user_connections(user_id)
            .iter()
            .filter(|handle| handle.send(event.clone()))
            .count()
    }

    /// Total live connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Distinct authenticated users with at least one connection.
    pub fn user_count(&self) -> usize {
        self.by_user.len()
    }
}
