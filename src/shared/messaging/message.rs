//! Chat Message Data Structure
//!
//! Represents a persisted message in a conversation. Messages are immutable
//! once stored; only `is_read` ever changes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ConversationId, MessageId, UserId};
use crate::shared::error::SharedError;

/// A stored chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Storage-assigned message ID
    pub id: MessageId,
    /// Conversation this message belongs to
    pub conversation_id: ConversationId,
    /// User who sent the message
    pub sender_id: UserId,
    /// Message text
    pub content: String,
    /// Whether a recipient has read the message
    pub is_read: bool,
    /// When the message was stored
    pub created_at: DateTime<Utc>,
}

/// A message that has not been stored yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub conversation_id: ConversationId,
    pub sender_id: UserId,
    pub content: String,
}

impl NewMessage {
    /// Build a new message, rejecting blank content
    pub fn new(
        conversation_id: ConversationId,
        sender_id: UserId,
        content: impl Into<String>,
    ) -> Result<Self, SharedError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SharedError::validation(
                "content",
                "message content cannot be empty",
            ));
        }

        Ok(Self {
            conversation_id,
            sender_id,
            content,
        })
    }
}

/// Paging parameters for `GET /api/conversations/{id}/messages`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagesQuery {
    #[serde(default = "MessagesQuery::default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

impl MessagesQuery {
    pub const DEFAULT_LIMIT: u32 = 50;
    pub const MAX_LIMIT: u32 = 100;

    fn default_limit() -> u32 {
        Self::DEFAULT_LIMIT
    }

    /// Limit clamped to `1..=MAX_LIMIT`
    pub fn clamped_limit(&self) -> u32 {
        self.limit.clamp(1, Self::MAX_LIMIT)
    }
}

impl Default for MessagesQuery {
    fn default() -> Self {
        Self {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_wire_format_is_camel_case() {
        let message = ChatMessage {
            id: 7,
            conversation_id: 3,
            sender_id: 1,
            content: "hi".to_string(),
            is_read: false,
            created_at: Utc::now(),
        };

        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["conversationId"], 3);
        assert_eq!(json["senderId"], 1);
        assert_eq!(json["isRead"], false);
        assert!(json.get("createdAt").is_some());
    }

    #[test]
    fn test_new_message_rejects_blank_content() {
        assert!(NewMessage::new(1, 1, "   ").is_err());
        assert!(NewMessage::new(1, 1, "hello").is_ok());
    }

    #[test]
    fn test_messages_query_defaults_and_clamp() {
        let query: MessagesQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(query, MessagesQuery::default());

        let query = MessagesQuery { limit: 10_000, offset: 5 };
        assert_eq!(query.clamped_limit(), MessagesQuery::MAX_LIMIT);

        let query = MessagesQuery { limit: 0, offset: 0 };
        assert_eq!(query.clamped_limit(), 1);
    }
}
