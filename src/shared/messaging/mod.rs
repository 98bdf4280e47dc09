//! Messaging Module
//!
//! This module contains the data structures for direct messaging:
//!
//! - `Conversation` - A conversation between users
//! - `ChatMessage` - A stored message in a conversation
//! - `NewMessage` - A validated message about to be stored
//!
//! # Usage
//!
//! ```rust
//! use nhcommunity::shared::messaging::{ChatMessage, Conversation, NewMessage};
//! ```

pub mod conversation;
pub mod message;

/// Opaque user identifier supplied by the authentication boundary
pub type UserId = u64;

/// Storage-assigned conversation identifier
pub type ConversationId = u64;

/// Storage-assigned message identifier
pub type MessageId = u64;

pub use conversation::{Conversation, CreateChatRequest, CreateChatResponse, MarkReadResponse};
pub use message::{ChatMessage, MessagesQuery, NewMessage};
