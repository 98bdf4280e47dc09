//! Chat REST Handlers
//!
//! Thin HTTP wrappers over [`ChatService`](super::ChatService). Every route
//! sits behind `auth_middleware`, so the caller is always known.
//!
//! - `GET  /api/conversations` - conversations of the caller
//! - `GET  /api/conversations/{id}/messages?limit&offset` - history page
//! - `POST /api/conversations/{id}/read` - mark the caller's inbox as read
//! - `POST /api/chats` - get or create a direct conversation

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::SharedChatService;
use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::shared::messaging::{
    ChatMessage, Conversation, ConversationId, CreateChatRequest, CreateChatResponse,
    MarkReadResponse, MessagesQuery, UserId,
};
use crate::shared::ApiResponse;

type ApiResult<T> = Result<Json<ApiResponse<T>>, BackendError>;

/// List the caller's conversations, most recently active first
pub async fn list_conversations(
    State(chat): State<SharedChatService>,
    AuthUser(user): AuthUser,
) -> ApiResult<Vec<Conversation>> {
    let conversations = chat.get_conversations_for_user(user.user_id).await?;
    Ok(Json(ApiResponse::ok(conversations)))
}

/// Page through a conversation's messages, newest first
pub async fn list_messages(
    State(chat): State<SharedChatService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<ConversationId>,
    Query(query): Query<MessagesQuery>,
) -> ApiResult<Vec<ChatMessage>> {
    ensure_participant(&chat, conversation_id, user.user_id).await?;

    let messages = chat
        .get_messages(conversation_id, query.clamped_limit(), query.offset)
        .await?;
    Ok(Json(ApiResponse::ok(messages)))
}

/// Mark the messages the caller did not send as read
pub async fn mark_read(
    State(chat): State<SharedChatService>,
    AuthUser(user): AuthUser,
    Path(conversation_id): Path<ConversationId>,
) -> ApiResult<MarkReadResponse> {
    ensure_participant(&chat, conversation_id, user.user_id).await?;

    let updated = chat
        .mark_conversation_read(conversation_id, user.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(MarkReadResponse { updated })))
}

/// Get or create the direct conversation with `userId`
pub async fn create_chat(
    State(chat): State<SharedChatService>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateChatRequest>,
) -> ApiResult<CreateChatResponse> {
    if request.user_id == user.user_id {
        return Err(BackendError::handler(
            StatusCode::BAD_REQUEST,
            "Cannot create a chat with yourself",
        ));
    }

    let conversation = chat
        .get_or_create_conversation(user.user_id, request.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(CreateChatResponse {
        session_id: conversation.id,
    })))
}

async fn ensure_participant(
    chat: &SharedChatService,
    conversation_id: ConversationId,
    user_id: UserId,
) -> Result<(), BackendError> {
    if chat.is_participant(conversation_id, user_id).await? {
        Ok(())
    } else {
        tracing::warn!(conversation_id, user_id, "Rejected access to conversation");
        Err(BackendError::handler(
            StatusCode::FORBIDDEN,
            "Not a participant in this conversation",
        ))
    }
}
