//! Connection session manager.
//!
//! Per-connection state machine: Unauthenticated → Connected →
//! [RoomJoined]* → Disconnected. A connection id is never reused after
//! disconnect; a reconnect gets a fresh handle and a fresh session.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use campushub_auth::JwtDecoder;
use campushub_core::config::RealtimeConfig;
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{ConnectionId, ConversationId};
use campushub_database::store::{ConversationStore, MessageStore, UserDirectory};
use campushub_entity::presence::{StatusChange, UserStatus};
use campushub_entity::session::SessionRecord;

use crate::connection::{ConnectionPool, SessionIdentity};
use crate::event::ServerEvent;
use crate::presence::PresenceStore;
use crate::room::{RoomRegistry, names};

/// Drives connect, room membership, and disconnect for every
/// connection.
pub struct SessionManager {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    presence: PresenceStore,
    decoder: JwtDecoder,
    users: Arc<dyn UserDirectory>,
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    config: RealtimeConfig,
}

impl SessionManager {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        pool: Arc<ConnectionPool>,
        rooms: Arc<RoomRegistry>,
        presence: PresenceStore,
        decoder: JwtDecoder,
        users: Arc<dyn UserDirectory>,
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            pool,
            rooms,
            presence,
            decoder,
            users,
            conversations,
            messages,
            config,
        }
    }

    /// Authenticates a connection and registers its session.
    ///
    /// On success the connection joins its personal notification room
    /// and, if this was the user's first session, an online status
    /// change goes out to the contacts channel (best-effort).
    pub async fn connect(&self, conn_id: ConnectionId, token: &str) -> AppResult<ServerEvent> {
        let handle = self
            .pool
            .get(conn_id)
            .ok_or_else(|| AppError::authentication("Unknown connection"))?;
        if handle.identity().is_some() {
            return Err(AppError::conflict("Connection is already authenticated"));
        }

        let claims = self.decoder.decode(token)?;
        let user = self
            .users
            .by_id(claims.user_id())
            .await?
            .ok_or_else(|| AppError::not_found("User no longer exists"))?;

        if self.pool.user_connections(user.id).len() >= self.config.max_connections_per_user {
            return Err(AppError::conflict("Too many concurrent connections"));
        }

        let record = SessionRecord::new(
            conn_id,
            user.id,
            user.username.clone(),
            user.avatar_ref.clone(),
        );
        let came_online = self.presence.set_user_online(&record).await?;

        let identity = SessionIdentity {
            session_id: record.id,
            user_id: user.id,
            username: user.username.clone(),
            avatar_ref: user.avatar_ref.clone(),
        };
        if !handle.bind_identity(identity) {
            // Lost a re-auth race on the same connection. The presence
            // registration above is rolled back so no orphan session
            // outlives the rejection.
            let _ = self.presence.set_user_offline(record.id).await;
            return Err(AppError::conflict("Connection is already authenticated"));
        }
        self.pool.index_user(&handle);
        self.rooms.join(conn_id, &names::user_room(user.id));

        if came_online {
            self.broadcast_status(&record, UserStatus::Online);
        }

        info!(user_id = %user.id, %conn_id, session_id = %record.id, "Session connected");
        Ok(ServerEvent::ConnectionStatus {
            status: "connected".to_string(),
            user_id: user.id,
            username: user.username,
            session_id: record.id,
        })
    }

    /// Joins a conversation room.
    ///
    /// Rejections (unknown conversation, non-participant) mutate no
    /// state. A presence store failure after the transport join rolls
    /// the join back: a partially joined room is reported as not joined.
    pub async fn join_room(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> AppResult<ServerEvent> {
        let (_, identity) = self.authenticated(conn_id)?;

        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))?;
        if !conversation.has_participant(identity.user_id) {
            return Err(AppError::authorization(
                "Not a participant of this conversation",
            ));
        }

        let room = names::conversation_room(conversation_id);
        self.rooms.join(conn_id, &room);
        if let Err(err) = self
            .presence
            .add_user_to_conversation(conversation_id, identity.user_id, identity.session_id)
            .await
        {
            self.rooms.leave(conn_id, &room);
            return Err(err);
        }

        if let Some(mut record) = self.presence.session(identity.session_id).await? {
            record.join_room(conversation_id);
            self.presence.save_session(&record).await?;
        }

        // Opening the conversation reads it. Non-critical: a failure
        // here does not undo the join.
        if let Err(err) = self
            .messages
            .mark_read(conversation_id, identity.user_id)
            .await
        {
            warn!(
                %conversation_id,
                user_id = %identity.user_id,
                error = %err,
                "Mark-read on join failed"
            );
        }

        debug!(%conn_id, %conversation_id, "Joined conversation room");
        Ok(ServerEvent::JoinedConversation { conversation_id })
    }

    /// Leaves a conversation room. A no-op when not a member.
    pub async fn leave_room(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
    ) -> AppResult<ServerEvent> {
        let (_, identity) = self.authenticated(conn_id)?;

        let room = names::conversation_room(conversation_id);
        if self.rooms.leave(conn_id, &room) {
            if let Some(mut record) = self.presence.session(identity.session_id).await? {
                record.leave_room(conversation_id);
                self.presence.save_session(&record).await?;
            }
            self.presence
                .remove_user_from_conversation(
                    conversation_id,
                    identity.user_id,
                    identity.session_id,
                )
                .await?;
            debug!(%conn_id, %conversation_id, "Left conversation room");
        }

        Ok(ServerEvent::LeftConversation { conversation_id })
    }

    /// Tears down a connection.
    ///
    /// The user id is recovered from the presence store session record,
    /// not from in-memory state, so teardown survives a process restart
    /// between connect and disconnect. The last session going away emits
    /// the offline broadcast.
    pub async fn disconnect(&self, conn_id: ConnectionId) -> AppResult<()> {
        let handle = self.pool.remove(conn_id);
        self.rooms.leave_all(conn_id);

        let Some(identity) = handle.as_ref().and_then(|h| h.identity().cloned()) else {
            debug!(%conn_id, "Unauthenticated connection closed");
            return Ok(());
        };

        match self.presence.set_user_offline(identity.session_id).await? {
            Some((record, went_offline)) => {
                for conversation_id in &record.rooms {
                    self.presence
                        .remove_user_from_conversation(
                            *conversation_id,
                            record.user_id,
                            record.id,
                        )
                        .await?;
                    // The flag would expire on its own; clearing it just
                    // stops the indicator sooner.
                    let _ = self
                        .presence
                        .set_typing(*conversation_id, record.user_id, false)
                        .await;
                }
                if went_offline {
                    self.broadcast_status(&record, UserStatus::Offline);
                }
                info!(
                    user_id = %record.user_id,
                    %conn_id,
                    session_id = %record.id,
                    went_offline,
                    "Session disconnected"
                );
            }
            None => {
                debug!(%conn_id, session_id = %identity.session_id, "Session already expired");
            }
        }

        if let Some(handle) = handle {
            handle.mark_dead();
        }
        Ok(())
    }

    /// Best-effort status broadcast to the user's contacts channel.
    fn broadcast_status(&self, record: &SessionRecord, status: UserStatus) {
        let event = ServerEvent::UserStatusChange {
            change: StatusChange {
                user_id: record.user_id,
                username: record.username.clone(),
                status,
                timestamp: Utc::now(),
            },
        };
        let delivered = self.rooms.emit_to_room(
            &self.pool,
            &names::contacts_room(record.user_id),
            &event,
        );
        debug!(
            user_id = %record.user_id,
            status = status.as_str(),
            delivered,
            "Status change broadcast"
        );
    }

    fn authenticated(
        &self,
        conn_id: ConnectionId,
    ) -> AppResult<(Arc<crate::connection::ConnectionHandle>, SessionIdentity)> {
        let handle = self
            .pool
            .get(conn_id)
            .ok_or_else(|| AppError::authentication("Unknown connection"))?;
        let identity = handle
            .identity()
            .cloned()
            .ok_or_else(|| AppError::authentication("Connection is not authenticated"))?;
        Ok((handle, identity))
    }
}
