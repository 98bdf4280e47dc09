//! Conversation Data Structure
//!
//! Represents a conversation between two or more users. The most recent
//! message is referenced by ID only; look it up through the chat service
//! when needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MessageId, UserId};

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Storage-assigned conversation ID
    pub id: ConversationId,
    /// When the conversation was created
    pub created_at: DateTime<Utc>,
    /// Bumped on every new message
    pub updated_at: DateTime<Utc>,
    /// Participant user IDs, in join order
    pub participants: Vec<UserId>,
    /// Most recent message, if any
    pub last_message_id: Option<MessageId>,
}

/// Request body for `POST /api/chats`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatRequest {
    pub user_id: UserId,
}

/// Response data for `POST /api/chats`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateChatResponse {
    pub session_id: ConversationId,
}

/// Response data for `POST /api/conversations/{id}/read`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MarkReadResponse {
    pub updated: u64,
}
