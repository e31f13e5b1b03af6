//! Message repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use campushub_core::error::{AppError, ErrorKind};
use campushub_core::result::AppResult;
use campushub_core::types::{ConversationId, MessageId, UserId};
use campushub_entity::message::{Message, NewMessage};

use crate::store::MessageStore;

/// Repository for message persistence and read tracking.
#[derive(Debug, Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn insert(&self, new_message: NewMessage) -> AppResult<Message> {
        // Message insert and last-message pointer update commit together;
        // a conversation never points at a message that was not persisted.
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Failed to begin transaction",
                e,
            )
        })?;

        let message = sqlx::query_as::<_, Message>(
            "INSERT INTO messages (id, conversation_id, sender_id, content, attachment_ref, read_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, ARRAY[$3], NOW()) \
             RETURNING *",
        )
        .bind(MessageId::new())
        .bind(new_message.conversation_id)
        .bind(new_message.sender_id)
        .bind(&new_message.content)
        .bind(&new_message.attachment_ref)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::DependencyUnavailable, "Failed to insert message", e)
        })?;

        sqlx::query(
            "UPDATE conversations SET last_message_id = $1, last_message_at = $2 WHERE id = $3",
        )
        .bind(message.id)
        .bind(message.created_at)
        .bind(message.conversation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Failed to update conversation pointer",
                e,
            )
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Failed to commit message insert",
                e,
            )
        })?;

        Ok(message)
    }

    async fn get(&self, id: MessageId) -> AppResult<Option<Message>> {
        sqlx::query_as::<_, Message>("SELECT * FROM messages WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::DependencyUnavailable, "Failed to find message", e)
            })
    }

    async fn list(
        &self,
        conversation_id: ConversationId,
        limit: u32,
        offset: u64,
    ) -> AppResult<Vec<Message>> {
        // Newest first, ties broken by id so pagination never skips or
        // duplicates rows written in the same microsecond.
        sqlx::query_as::<_, Message>(
            "SELECT * FROM messages WHERE conversation_id = $1 \
             ORDER BY created_at DESC, id DESC \
             LIMIT $2 OFFSET $3",
        )
        .bind(conversation_id)
        .bind(i64::from(limit))
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::DependencyUnavailable, "Failed to list messages", e)
        })
    }

    async fn mark_read(&self, conversation_id: ConversationId, reader: UserId) -> AppResult<u64> {
        // The @> guard keeps read_by append-only and idempotent; re-marking
        // an already read message matches zero rows.
        let result = sqlx::query(
            "UPDATE messages SET read_by = array_append(read_by, $2) \
             WHERE conversation_id = $1 AND NOT read_by @> ARRAY[$2]",
        )
        .bind(conversation_id)
        .bind(reader)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Failed to mark messages read",
                e,
            )
        })?;

        Ok(result.rows_affected())
    }
}
