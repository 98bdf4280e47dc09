//! Shared Module
//!
//! This module contains the types that cross the chat boundary: the
//! WebSocket wire envelope, the stored conversation and message shapes and
//! the REST response wrapper. Nothing here touches the network or the
//! database, so the module builds without the `ssr` feature.
//!
//! # Overview
//!
//! - **`envelope`** - Tagged JSON frames exchanged over the chat socket
//! - **`messaging`** - Conversations, messages and their REST request types
//! - **`api`** - `{ success, data | message }` response body
//! - **`error`** - Decode and validation errors

/// Wire envelope for the chat socket
pub mod envelope;

/// Shared error types
pub mod error;

/// Conversation and message types
pub mod messaging;

/// REST response wrapper
pub mod api;

/// Re-export commonly used types for convenience
pub use api::ApiResponse;
pub use envelope::{Envelope, EnvelopeKind, PrivateMessagePayload};
pub use error::SharedError;
pub use messaging::{ChatMessage, Conversation, ConversationId, MessageId, NewMessage, UserId};
