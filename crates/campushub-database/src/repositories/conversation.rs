//! Conversation repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use campushub_core::error::{AppError, ErrorKind};
use campushub_core::result::AppResult;
use campushub_core::types::{ConversationId, UserId};
use campushub_entity::conversation::{Conversation, canonical_pair};

use crate::store::ConversationStore;

/// Repository for conversation lookup and idempotent creation.
#[derive(Debug, Clone)]
pub struct ConversationRepository {
    pool: PgPool,
}

impl ConversationRepository {
    /// Create a new conversation repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for ConversationRepository {
    async fn find_or_create(&self, a: UserId, b: UserId) -> AppResult<Conversation> {
        if a == b {
            return Err(AppError::validation(
                "A conversation requires two distinct participants",
            ));
        }
        let (lo, hi) = canonical_pair(a, b);

        // ON CONFLICT DO NOTHING keeps creation idempotent under
        // concurrent first contact from both sides; the follow-up SELECT
        // always observes exactly one row for the pair.
        sqlx::query(
            "INSERT INTO conversations (id, participant_a, participant_b, created_at) \
             VALUES ($1, $2, $3, NOW()) \
             ON CONFLICT (participant_a, participant_b) DO NOTHING",
        )
        .bind(ConversationId::new())
        .bind(lo)
        .bind(hi)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::DependencyUnavailable, "Failed to create conversation", e)
        })?;

        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations WHERE participant_a = $1 AND participant_b = $2",
        )
        .bind(lo)
        .bind(hi)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::DependencyUnavailable, "Failed to load conversation", e)
        })
    }

    async fn get(&self, id: ConversationId) -> AppResult<Option<Conversation>> {
        sqlx::query_as::<_, Conversation>("SELECT * FROM conversations WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::DependencyUnavailable,
                    "Failed to find conversation",
                    e,
                )
            })
    }

    async fn list_for_user(&self, user_id: UserId) -> AppResult<Vec<Conversation>> {
        sqlx::query_as::<_, Conversation>(
            "SELECT * FROM conversations \
             WHERE participant_a = $1 OR participant_b = $1 \
             ORDER BY last_message_at DESC NULLS LAST, created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::DependencyUnavailable,
                "Failed to list conversations",
                e,
            )
        })
    }
}
