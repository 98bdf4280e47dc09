//! Chat Backend Module
//!
//! Conversation and message storage plus the REST endpoints that read it.
//!
//! # Architecture
//!
//! - **`service`** - The `ChatService` trait and `ChatError`
//! - **`db`** - `SqliteChatStore`, the sqlx implementation of the trait
//! - **`handlers`** - Axum handlers for the chat REST routes
//!
//! The realtime hub talks to storage through the same trait object as the
//! handlers, so there is exactly one write path for messages.
//!
//! # Example
//!
//! ```rust,no_run
//! use nhcommunity::backend::chat::{ChatService, SqliteChatStore};
//! use nhcommunity::shared::NewMessage;
//!
//! # async fn example() -> Result<(), nhcommunity::backend::chat::ChatError> {
//! let store = SqliteChatStore::in_memory().await?;
//! let conversation = store.get_or_create_conversation(1, 2).await?;
//! let message = store
//!     .create_message(NewMessage::new(conversation.id, 1, "hi")?)
//!     .await?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

/// Chat service trait and errors
pub mod service;

/// SQLite persistence
pub mod db;

/// REST handlers
pub mod handlers;

/// Chat service shared between the hub sessions and the REST handlers
pub type SharedChatService = Arc<dyn ChatService>;

/// Re-export commonly used types
pub use db::SqliteChatStore;
pub use service::{ChatError, ChatService};
