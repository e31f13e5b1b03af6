//! Conversation and message REST handlers.
//!
//! A thin surface over the store traits and the fan-out engine; the
//! WebSocket path is the primary interface and these routes exist for
//! initial page loads and HTTP-origin sends.

use axum::Json;
use axum::extract::{Path, Query, State};
use validator::Validate;

use campushub_core::error::AppError;
use campushub_core::types::ConversationId;
use campushub_entity::message::Message;

use crate::dto::{
    ConversationResponse, CreateConversationRequest, MarkReadResponse, MessagePage, MessagesQuery,
    SendMessageRequest,
};
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/conversations
pub async fn list_conversations(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> ApiResult<Json<Vec<ConversationResponse>>> {
    let conversations = state.conversations.list_for_user(user.id).await?;
    Ok(Json(
        conversations.into_iter().map(ConversationResponse::from).collect(),
    ))
}

/// POST /api/conversations
///
/// Find-or-create with a peer. Idempotent: repeating the call (from
/// either side) returns the same conversation.
pub async fn create_conversation(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(body): Json<CreateConversationRequest>,
) -> ApiResult<Json<ConversationResponse>> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    state
        .users
        .by_id(body.peer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Peer not found"))?;

    let conversation = state
        .conversations
        .find_or_create(user.id, body.peer_id)
        .await?;
    Ok(Json(conversation.into()))
}

/// GET /api/conversations/{id}/messages?page&limit
pub async fn list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Json<MessagePage>> {
    require_participant(&state, conversation_id, &user).await?;

    let limit = query.capped_limit();
    let messages = state
        .engine
        .fanout()
        .messages(conversation_id, query.page, limit)
        .await?;
    Ok(Json(MessagePage {
        messages,
        page: query.page,
        limit,
    }))
}

/// POST /api/conversations/{id}/messages
///
/// HTTP-origin send. Goes through the fan-out engine so connected
/// participants still receive the realtime broadcast.
pub async fn send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Json(body): Json<SendMessageRequest>,
) -> ApiResult<Json<Message>> {
    body.validate()
        .map_err(|e| AppError::validation(e.to_string()))?;
    let message = state
        .engine
        .fanout()
        .send_message_as_user(&user, conversation_id, &body.content)
        .await?;
    Ok(Json(message))
}

/// POST /api/conversations/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<Json<MarkReadResponse>> {
    require_participant(&state, conversation_id, &user).await?;

    let updated = state
        .engine
        .fanout()
        .mark_read(conversation_id, user.id)
        .await?;
    Ok(Json(MarkReadResponse { updated }))
}

async fn require_participant(
    state: &AppState,
    conversation_id: ConversationId,
    user: &campushub_entity::user::User,
) -> Result<(), AppError> {
    let conversation = state
        .conversations
        .get(conversation_id)
        .await?
        .ok_or_else(|| AppError::not_found("Conversation not found"))?;
    if !conversation.has_participant(user.id) {
        return Err(AppError::authorization(
            "Not a participant of this conversation",
        ));
    }
    Ok(())
}
