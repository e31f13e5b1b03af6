//! Room registry mapping room names to the connections joined to them.
//!
//! Holds only this process's live connections. Cross-process room
//! membership lives in the presence store; this registry is the local
//! broadcast primitive.

use std::collections::HashSet;

use dashmap::DashMap;
use tracing::trace;

use campushub_core::types::ConnectionId;

use crate::connection::ConnectionPool;
use crate::event::ServerEvent;

/// Thread-safe room membership index with a reverse index per connection.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    /// Room name → member connection ids.
    rooms: DashMap<String, HashSet<ConnectionId>>,
    /// Connection id → rooms joined, for O(1) teardown on disconnect.
    memberships: DashMap<ConnectionId, HashSet<String>>,
}

impl RoomRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins a connection to a room. Returns `false` if it was already a
    /// member.
    pub fn join(&self, conn_id: ConnectionId, room: &str) -> bool {
        let newly_added = self.rooms.entry(room.to_string()).or_default().insert(conn_id);
        if newly_added {
            self.memberships
                .entry(conn_id)
                .or_default()
                .insert(room.to_string());
            trace!(%conn_id, room, "Connection joined room");
        }
        newly_added
    }

    /// Removes a connection from a room. Returns `false` if it was not a
    /// member.
    pub fn leave(&self, conn_id: ConnectionId, room: &str) -> bool {
        let removed = match self.rooms.get_mut(room) {
            Some(mut members) => {
                let removed = members.remove(&conn_id);
                let now_empty = members.is_empty();
                drop(members);
                if now_empty {
                    self.rooms.remove_if(room, |_, members| members.is_empty());
                }
                removed
            }
            None => false,
        };
        if removed {
            if let Some(mut rooms) = self.memberships.get_mut(&conn_id) {
                rooms.remove(room);
            }
            trace!(%conn_id, room, "Connection left room");
        }
        removed
    }

    /// Removes a connection from every room it joined. Returns the room
    /// names it was a member of.
    pub fn leave_all(&self, conn_id: ConnectionId) -> Vec<String> {
        let rooms: Vec<String> = self
            .memberships
            .remove(&conn_id)
            .map(|(_, rooms)| rooms.into_iter().collect())
            .unwrap_or_default();
        for room in &rooms {
            if let Some(mut members) = self.rooms.get_mut(room) {
                members.remove(&conn_id);
                let now_empty = members.is_empty();
                drop(members);
                if now_empty {
                    self.rooms.remove_if(room, |_, members| members.is_empty());
                }
            }
        }
        rooms
    }

    /// Whether the connection is currently a member of the room.
    pub fn is_member(&self, conn_id: ConnectionId, room: &str) -> bool {
        self.rooms
            .get(room)
            .map(|members| members.contains(&conn_id))
            .unwrap_or(false)
    }

    /// Current members of a room.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Number of members in a room.
    pub fn member_count(&self, room: &str) -> usize {
        self.rooms.get(room).map(|members| members.len()).unwrap_or(0)
    }

    /// Delivers an event to every live connection in a room.
    ///
    /// Fire-and-forget: returns the number of connections the event was
    /// queued for. The member snapshot is taken before any send so no
    /// dashmap guard is held while delivering.
    pub fn emit_to_room(&self, pool: &ConnectionPool, room: &str, event: &ServerEvent) -> usize {
        self.emit_filtered(pool, room, event, None)
    }

    /// Delivers an event to a room, skipping one connection (typically
    /// the originator).
    pub fn emit_to_room_except(
        &self,
        pool: &ConnectionPool,
        room: &str,
        except: ConnectionId,
        event: &ServerEvent,
    ) -> usize {
        self.emit_filtered(pool, room, event, Some(except))
    }

    fn emit_filtered(
        &self,
        pool: &ConnectionPool,
        room: &str,
        event: &ServerEvent,
        except: Option<ConnectionId>,
    ) -> usize {
        let members = self.members(room);
        let mut delivered = 0;
        for conn_id in members {
            if Some(conn_id) == except {
                continue;
            }
            if let Some(handle) = pool.get(conn_id) {
                if handle.send(event.clone()) {
                    delivered += 1;
                }
            }
        }
        delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_and_leave() {
        let registry = RoomRegistry::new();
        let conn = ConnectionId::new();

        assert!(registry.join(conn, "room-a"));
        assert!(!registry.join(conn, "room-a"));
        assert!(registry.is_member(conn, "room-a"));

        assert!(registry.leave(conn, "room-a"));
        assert!(!registry.leave(conn, "room-a"));
        assert!(!registry.is_member(conn, "room-a"));
        assert_eq!(registry.member_count("room-a"), 0);
    }

    #[test]
    fn test_leave_all_clears_reverse_index() {
        let registry = RoomRegistry::new();
        let conn = ConnectionId::new();
        registry.join(conn, "room-a");
        registry.join(conn, "room-b");

        let mut left = registry.leave_all(conn);
        left.sort();
        assert_eq!(left, vec!["room-a".to_string(), "room-b".to_string()]);
        assert!(!registry.is_member(conn, "room-a"));
        assert!(!registry.is_member(conn, "room-b"));
        assert!(registry.leave_all(conn).is_empty());
    }

    #[test]
    fn test_members_snapshot() {
        let registry = RoomRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        registry.join(a, "room");
        registry.join(b, "room");

        let members = registry.members("room");
        assert_eq!(members.len(), 2);
        assert!(members.contains(&a));
        assert!(members.contains(&b));
    }
}
