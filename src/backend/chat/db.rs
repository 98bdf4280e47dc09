//! SQLite Chat Store
//!
//! [`ChatService`] backed by a `sqlx` SQLite pool. The schema lives in
//! `migrations/` and is applied with [`SqliteChatStore::migrate`].
//!
//! Direct conversations carry a `direct_key` of the form `"low:high"`; its
//! unique constraint is what keeps concurrent `get_or_create_conversation`
//! callers from creating duplicates.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use super::service::{ChatError, ChatService};
use crate::shared::messaging::{
    ChatMessage, Conversation, ConversationId, NewMessage, UserId,
};

/// Chat storage over a SQLite connection pool
#[derive(Debug, Clone)]
pub struct SqliteChatStore {
    pool: SqlitePool,
}

impl SqliteChatStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url`
    pub async fn connect(database_url: &str) -> Result<Self, ChatError> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Ok(Self::new(pool))
    }

    /// Private in-memory database, already migrated.
    ///
    /// Every connection to `sqlite::memory:` is a separate database, so the
    /// pool is pinned to one connection that is never recycled.
    pub async fn in_memory() -> Result<Self, ChatError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Apply pending schema migrations
    pub async fn migrate(&self) -> Result<(), ChatError> {
        sqlx::migrate!().run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn conversation_by_key(&self, key: &str) -> Result<Option<Conversation>, ChatError> {
        let row = sqlx::query(
            r#"
            SELECT id, last_message_id, created_at, updated_at
            FROM conversations
            WHERE direct_key = ?
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(self.conversation_from_row(&row).await?)),
            None => Ok(None),
        }
    }

    async fn conversation_from_row(&self, row: &SqliteRow) -> Result<Conversation, ChatError> {
        let id: i64 = row.try_get("id")?;
        let last_message_id: Option<i64> = row.try_get("last_message_id")?;

        Ok(Conversation {
            id: from_db_id(id)?,
            created_at: parse_timestamp(row.try_get("created_at")?)?,
            updated_at: parse_timestamp(row.try_get("updated_at")?)?,
            participants: self.participants(id).await?,
            last_message_id: last_message_id.map(from_db_id).transpose()?,
        })
    }

    async fn participants(&self, conversation_id: i64) -> Result<Vec<UserId>, ChatError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id
            FROM conversation_participants
            WHERE conversation_id = ?
            ORDER BY joined_at, user_id
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| from_db_id(row.try_get("user_id")?))
            .collect()
    }
}

#[async_trait]
impl ChatService for SqliteChatStore {
    async fn get_or_create_conversation(
        &self,
        user_a: UserId,
        user_b: UserId,
    ) -> Result<Conversation, ChatError> {
        if user_a == user_b {
            return Err(ChatError::SelfConversation);
        }

        let (low, high) = (user_a.min(user_b), user_a.max(user_b));
        let key = direct_key(low, high);
        let now = format_timestamp(Utc::now());

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO conversations (direct_key, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(direct_key) DO NOTHING
            "#,
        )
        .bind(&key)
        .bind(&now)
        .bind(&now)
        .execute(&mut *tx)
        .await?;

        if inserted.rows_affected() == 1 {
            let conversation_id = inserted.last_insert_rowid();
            for user_id in [low, high] {
                sqlx::query(
                    r#"
                    INSERT INTO conversation_participants (conversation_id, user_id, joined_at)
                    VALUES (?, ?, ?)
                    "#,
                )
                .bind(conversation_id)
                .bind(to_db_id(user_id)?)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            }
            tracing::info!(conversation_id, user_a = low, user_b = high, "Created direct conversation");
        }

        tx.commit().await?;

        self.conversation_by_key(&key)
            .await?
            .ok_or_else(|| ChatError::Database(sqlx::Error::RowNotFound))
    }

    async fn create_message(&self, message: NewMessage) -> Result<ChatMessage, ChatError> {
        let conversation_id = to_db_id(message.conversation_id)?;
        let sender_id = to_db_id(message.sender_id)?;
        let now = format_timestamp(Utc::now());

        let mut tx = self.pool.begin().await?;

        // Write first so the transaction takes the write lock up front
        let touched = sqlx::query("UPDATE conversations SET updated_at = ? WHERE id = ?")
            .bind(&now)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;
        if touched.rows_affected() == 0 {
            return Err(ChatError::ConversationNotFound(message.conversation_id));
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO messages (conversation_id, sender_id, content, is_read, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#,
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(&message.content)
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        let message_id = inserted.last_insert_rowid();

        sqlx::query("UPDATE conversations SET last_message_id = ? WHERE id = ?")
            .bind(message_id)
            .bind(conversation_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ChatMessage {
            id: from_db_id(message_id)?,
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            is_read: false,
            created_at: parse_timestamp(now)?,
        })
    }

    async fn get_conversations_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Conversation>, ChatError> {
        let rows = sqlx::query(
            r#"
            SELECT c.id, c.last_message_id, c.created_at, c.updated_at
            FROM conversations c
            JOIN conversation_participants p ON p.conversation_id = c.id
            WHERE p.user_id = ?
            ORDER BY c.updated_at DESC, c.id DESC
            "#,
        )
        .bind(to_db_id(user_id)?)
        .fetch_all(&self.pool)
        .await?;

        let mut conversations = Vec::with_capacity(rows.len());
        for row in &rows {
            conversations.push(self.conversation_from_row(row).await?);
        }
        Ok(conversations)
    }

    async fn get_messages(
        &self,
        conversation_id: ConversationId,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        let rows = sqlx::query(
            r#"
            SELECT id, conversation_id, sender_id, content, is_read, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(to_db_id(conversation_id)?)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(message_from_row).collect()
    }

    async fn is_participant(
        &self,
        conversation_id: ConversationId,
        user_id: UserId,
    ) -> Result<bool, ChatError> {
        let row = sqlx::query(
            r#"
            SELECT 1
            FROM conversation_participants
            WHERE conversation_id = ? AND user_id = ?
            "#,
        )
        .bind(to_db_id(conversation_id)?)
        .bind(to_db_id(user_id)?)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn mark_conversation_read(
        &self,
        conversation_id: ConversationId,
        reader: UserId,
    ) -> Result<u64, ChatError> {
        let result = sqlx::query(
            r#"
            UPDATE messages
            SET is_read = 1
            WHERE conversation_id = ? AND sender_id != ? AND is_read = 0
            "#,
        )
        .bind(to_db_id(conversation_id)?)
        .bind(to_db_id(reader)?)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

fn message_from_row(row: &SqliteRow) -> Result<ChatMessage, ChatError> {
    Ok(ChatMessage {
        id: from_db_id(row.try_get("id")?)?,
        conversation_id: from_db_id(row.try_get("conversation_id")?)?,
        sender_id: from_db_id(row.try_get("sender_id")?)?,
        content: row.try_get("content")?,
        is_read: row.try_get("is_read")?,
        created_at: parse_timestamp(row.try_get("created_at")?)?,
    })
}

fn direct_key(low: UserId, high: UserId) -> String {
    format!("{}:{}", low, high)
}

// SQLite integers are signed
fn to_db_id(id: u64) -> Result<i64, ChatError> {
    i64::try_from(id).map_err(|_| ChatError::InvalidId(id))
}

fn from_db_id(id: i64) -> Result<u64, ChatError> {
    u64::try_from(id).map_err(|e| ChatError::Database(sqlx::Error::Decode(Box::new(e))))
}

// Fixed width so that text ordering matches time ordering
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(text: String) -> Result<DateTime<Utc>, ChatError> {
    DateTime::parse_from_rfc3339(&text)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| ChatError::Database(sqlx::Error::Decode(Box::new(e))))
}
