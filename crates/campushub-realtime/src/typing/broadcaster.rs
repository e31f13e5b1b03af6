//! Typing indicator state and broadcast.
//!
//! Nothing here persists. The presence store flag self-expires, so a
//! client that crashes mid-typing clears on its own without any active
//! expiry logic on this side.

use std::sync::Arc;

use tracing::debug;

use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{ConnectionId, ConversationId, UserId};

use crate::connection::{ConnectionPool, SessionIdentity};
use crate::event::ServerEvent;
use crate::presence::PresenceStore;
use crate::room::{RoomRegistry, names};

/// Broadcasts typing indicators to conversation rooms.
pub struct TypingBroadcaster {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    presence: PresenceStore,
}

impl TypingBroadcaster {
    pub fn new(
        pool: Arc<ConnectionPool>,
        rooms: Arc<RoomRegistry>,
        presence: PresenceStore,
    ) -> Self {
        Self {
            pool,
            rooms,
            presence,
        }
    }

    /// Sets the typing flag and notifies the room, excluding the typist.
    pub async fn start_typing(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> AppResult<()> {
        self.set_typing(conn_id, conversation_id, true).await
    }

    /// Clears the typing flag and notifies the room, excluding the
    /// typist.
    pub async fn stop_typing(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> AppResult<()> {
        self.set_typing(conn_id, conversation_id, false).await
    }

    /// Users currently typing in a conversation.
    pub async fn typing_users(&self, conversation_id: ConversationId) -> AppResult<Vec<UserId>> {
        self.presence.typing_users(conversation_id).await
    }

    async fn set_typing(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
        typing: bool,
    ) -> AppResult<()> {
        let identity = self.authenticated(conn_id)?;
        self.presence
            .set_typing(conversation_id, identity.user_id, typing)
            .await?;

        let delivered = self.rooms.emit_to_room_except(
            &self.pool,
            &names::conversation_room(conversation_id),
            conn_id,
            &ServerEvent::UserTyping {
                user_id: identity.user_id,
                conversation_id,
                typing,
            },
        );
        debug!(
            user_id = %identity.user_id,
            %conversation_id,
            typing,
            delivered,
            "Typing indicator broadcast"
        );
        Ok(())
    }

    fn authenticated(&self, conn_id: ConnectionId) -> AppResult<SessionIdentity> {
        self.pool
            .get(conn_id)
            .ok_or_else(|| AppError::authentication("Unknown connection"))?
            .identity()
            .cloned()
            .ok_or_else(|| AppError::authentication("Connection is not authenticated"))
    }
}
