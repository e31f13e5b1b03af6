//! Message fan-out engine.
//!
//! The durable write is the system of record; every broadcast after it
//! is a notification optimization. A transport or presence failure after
//! a successful insert never turns a sent message into an error.

use std::sync::Arc;

use tracing::{debug, warn};

use campushub_core::config::RealtimeConfig;
use campushub_core::error::AppError;
use campushub_core::result::AppResult;
use campushub_core::types::{ConnectionId, ConversationId, UserId};
use campushub_database::store::{ConversationStore, MessageStore};
use campushub_entity::conversation::Conversation;
use campushub_entity::message::{Message, NewMessage};
use campushub_entity::user::User;

use crate::connection::{ConnectionPool, SessionIdentity};
use crate::event::ServerEvent;
use crate::presence::PresenceStore;
use crate::room::{RoomRegistry, names};

/// Persists messages and delivers them to rooms and personal channels.
pub struct FanoutEngine {
    pool: Arc<ConnectionPool>,
    rooms: Arc<RoomRegistry>,
    presence: PresenceStore,
    conversations: Arc<dyn ConversationStore>,
    messages: Arc<dyn MessageStore>,
    config: RealtimeConfig,
}

impl FanoutEngine {
    pub fn new(
        pool: Arc<ConnectionPool>,
        rooms: Arc<RoomRegistry>,
        presence: PresenceStore,
        conversations: Arc<dyn ConversationStore>,
        messages: Arc<dyn MessageStore>,
        config: RealtimeConfig,
    ) -> Self {
        Self {
            pool,
            rooms,
            presence,
            conversations,
            messages,
            config,
        }
    }

    /// Persists and fans out a message from a live connection.
    ///
    /// Validation and authorization happen before the durable write; a
    /// durable write failure surfaces as an error so the client knows
    /// the message was not sent.
    pub async fn send_message(
        &self,
        conn_id: ConnectionId,
        conversation_id: ConversationId,
        content: &str,
    ) -> AppResult<ServerEvent> {
        let identity = self.authenticated(conn_id)?;
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message content must not be empty"));
        }
        if content.chars().count() > self.config.max_message_length {
            return Err(AppError::validation(format!(
                "Message content exceeds {} characters",
                self.config.max_message_length
            )));
        }

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

        let message = self
            .messages
            .insert(NewMessage {
                conversation_id,
                sender_id: identity.user_id,
                content: content.to_string(),
                attachment_ref: None,
            })
            .await?;

        // Everything below is post-write: best-effort, never an error
        // back to the sender.
        self.fan_out(&conversation, &message, &identity).await;

        if let Err(err) = self
            .presence
            .set_typing(conversation_id, identity.user_id, false)
            .await
        {
            warn!(%conversation_id, error = %err, "Failed to clear typing flag after send");
        }

        Ok(ServerEvent::MessageSent {
            message_id: message.id,
            timestamp: message.created_at,
        })
    }

    /// HTTP-origin send: same validation and fan-out, authenticated by
    /// user id instead of a live connection.
    pub async fn send_message_as_user(
        &self,
        sender: &User,
        conversation_id: ConversationId,
        content: &str,
    ) -> AppResult<Message> {
        let content = content.trim();
        if content.is_empty() {
            return Err(AppError::validation("Message content must not be empty"));
        }
        if content.chars().count() > self.config.max_message_length {
            return Err(AppError::validation(format!(
                "Message content exceeds {} characters",
                self.config.max_message_length
            )));
        }

        let conversation = self
            .conversations
            .get(conversation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Conversation not found"))?;
        if !conversation.has_participant(sender.id) {
            return Err(AppError::authorization(
                "Not a participant of this conversation",
            ));
        }

        let message = self
            .messages
            .insert(NewMessage {
                conversation_id,
                sender_id: sender.id,
                content: content.to_string(),
                attachment_ref: None,
            })
            .await?;

        let identity = SessionIdentity {
            session_id: campushub_core::types::SessionId::new(),
            user_id: sender.id,
            username: sender.username.clone(),
            avatar_ref: sender.avatar_ref.clone(),
        };
        self.fan_out(&conversation, &message, &identity).await;
        Ok(message)
    }

    /// Marks every message in the conversation read by the user.
    /// Idempotent; returns the number of messages newly marked.
    pub async fn mark_read(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> AppResult<u64> {
        self.messages.mark_read(conversation_id, user_id).await
    }

    /// A page of messages in chronological order (oldest first).
    ///
    /// Storage order is newest-first so the latest page is cheap; the
    /// page is reversed before delivery because clients render
    /// top-to-bottom.
    pub async fn messages(
        &self,
        conversation_id: ConversationId,
        page: u64,
        limit: u32,
    ) -> AppResult<Vec<Message>> {
        let offset = page.saturating_mul(u64::from(limit));
        let mut page = self.messages.list(conversation_id, limit, offset).await?;
        page.reverse();
        Ok(page)
    }

    /// Room broadcast plus personal-channel notifications for online
    /// participants who do not have the conversation open.
    async fn fan_out(
        &self,
        conversation: &Conversation,
        message: &Message,
        sender_identity: &SessionIdentity,
    ) {
        if let Err(err) = self.presence.cache_message(message).await {
            warn!(message_id = %message.id, error = %err, "Message cache write failed");
        }

        let sender = User {
            id: sender_identity.user_id,
            username: sender_identity.username.clone(),
            avatar_ref: sender_identity.avatar_ref.clone(),
        };
        let room = names::conversation_room(message.conversation_id);
        let delivered = self.rooms.emit_to_room(
            &self.pool,
            &room,
            &ServerEvent::NewMessage {
                message: message.clone(),
                sender: sender.clone(),
            },
        );
        debug!(message_id = %message.id, delivered, "Message broadcast to room");

        // Presence reads degrade to "no notification" on failure.
        let room_users = match self.presence.conversation_users(message.conversation_id).await {
            Ok(users) => users,
            Err(err) => {
                warn!(
                    conversation_id = %message.conversation_id,
                    error = %err,
                    "Room occupancy read failed, skipping notifications"
                );
                return;
            }
        };

        for participant in conversation.participants() {
            if participant == sender_identity.user_id || room_users.contains(&participant) {
                continue;
            }
            match self.presence.is_user_online(participant).await {
                Ok(true) => {
                    let notified = self.rooms.emit_to_room(
                        &self.pool,
                        &names::user_room(participant),
                        &ServerEvent::NewMessageNotification {
                            message: message.clone(),
                            conversation_id: message.conversation_id,
                            sender: sender.clone(),
                        },
                    );
                    debug!(
                        user_id = %participant,
                        message_id = %message.id,
                        notified,
                        "Personal notification sent"
                    );
                }
                Ok(false) => {}
                Err(err) => {
                    warn!(
                        user_id = %participant,
                        error = %err,
                        "Online check failed, skipping notification"
                    );
                }
            }
        }
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
