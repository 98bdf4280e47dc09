/**
 * Chat Service Boundary
 *
 * The hub and the REST handlers only ever see chat storage through the
 * `ChatService` trait. The production implementation is
 * [`SqliteChatStore`](super::db::SqliteChatStore); tests can substitute
 * anything that satisfies the same contract.
 *
 * # Contract
 *
 * - `get_or_create_conversation` returns the same conversation for an
 *   unordered pair of users no matter how many callers race on it.
 * - `create_message` stores the message and moves the conversation's
 *   last-message pointer and `updated_at` in one step.
 * - Read paths never mutate anything except `mark_conversation_read`,
 *   which only flips the read flag.
 */
use async_trait::async_trait;
use thiserror::Error;

use crate::shared::messaging::{ChatMessage, Conversation, ConversationId, NewMessage, UserId};
use crate::shared::SharedError;

/// Errors surfaced by chat storage
#[derive(Debug, Error)]
pub enum ChatError {
    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failure at startup
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// An identifier does not fit the storage representation
    #[error("Invalid identifier: {0}")]
    InvalidId(u64),

    /// A direct conversation needs two distinct users
    #[error("Cannot start a conversation with yourself")]
    SelfConversation,

    /// No conversation with that identifier exists
    #[error("Conversation {0} not found")]
    ConversationNotFound(ConversationId),

    /// The input failed validation
    #[error(transparent)]
    Validation(#[from] SharedError),
}

/// Storage operations the chat subsystem depends on
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Find the direct conversation between two users, creating it on first use
    async fn get_or_create_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Conversation, ChatError>;

    /// Store a message and update its conversation's last-message pointer
    async fn create_message(&self, message: NewMessage) -> Result<ChatMessage, ChatError>;

    /// All conversations a user takes part in, most recently active first
    async fn get_conversations_for_user(&self, user_id: UserId)
        -> Result<Vec<Conversation>, ChatError>;

    /// A page of a conversation's history, newest first
    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ChatMessage>, ChatError>;

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, ChatError>;

    /// Mark every message `reader` did not send as read; returns how many changed
    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> Result<u64, ChatError>;
}
