//! Database test fixtures
//!
//! Every fixture gets its own migrated in-memory SQLite database, so tests
//! never see each other's rows and need no cleanup.

#[cfg(feature = "ssr")]
use std::sync::Arc;
#[cfg(feature = "ssr")]
use tempfile::TempDir;

#[cfg(feature = "ssr")]
use nhcommunity::backend::chat::{ChatService, SharedChatService, SqliteChatStore};
#[cfg(feature = "ssr")]
use nhcommunity::shared::{ChatMessage, ConversationId, NewMessage, UserId};

/// Test database fixture
#[cfg(feature = "ssr")]
pub struct TestDatabase {
    store: Arc<SqliteChatStore>,
}

#[cfg(feature = "ssr")]
impl TestDatabase {
    /// Create a new migrated in-memory database
    pub async fn new() -> Self {
        let store = SqliteChatStore::in_memory()
            .await
            .expect("Failed to create in-memory chat store");
        Self {
            store: Arc::new(store),
        }
    }

    pub fn store(&self) -> Arc<SqliteChatStore> {
        self.store.clone()
    }

    /// The store as the trait object handlers and sessions use
    pub fn service(&self) -> SharedChatService {
        self.store.clone()
    }

    /// Open (or reuse) the direct conversation between two users
    pub async fn conversation(&self, a: UserId, b: UserId) -> ConversationId {
        self.store
            .get_or_create_conversation(a, b)
            .await
            .expect("Failed to create conversation")
            .id
    }

    /// Store a message without going through a socket
    pub async fn seed_message(
        &self,
        conversation_id: ConversationId,
        sender_id: UserId,
        content: &str,
    ) -> ChatMessage {
        let message =
            NewMessage::new(conversation_id, sender_id, content).expect("Invalid seed message");
        self.store
            .create_message(message)
            .await
            .expect("Failed to seed message")
    }
}

/// A SQLite database file in a private temporary directory
///
/// Used where a test needs several real connections to one database.
/// The directory and everything SQLite put in it are removed on drop.
#[cfg(feature = "ssr")]
pub struct TempDatabaseFile {
    dir: TempDir,
}

#[cfg(feature = "ssr")]
impl TempDatabaseFile {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn url(&self) -> String {
        format!("sqlite://{}", self.dir.path().join("chat.db").display())
    }
}
