/**
 * Server Configuration
 *
 * This module handles loading and validation of server configuration.
 *
 * # Configuration Sources
 *
 * Configuration is read from environment variables (a `.env` file is
 * loaded by the binary first), with defaults for local development:
 *
 * | Variable | Default |
 * |---|---|
 * | `SERVER_PORT` | `8080` |
 * | `DATABASE_URL` | `sqlite://nhcommunity.db` |
 * | `JWT_SECRET` | required |
 * | `CLIENT_ORIGIN` | `http://localhost:3000` |
 * | `CHAT_WRITE_WAIT_SECS` | `10` |
 * | `CHAT_PONG_WAIT_SECS` | `60` |
 * | `CHAT_PING_PERIOD_SECS` | 9/10 of the pong wait |
 * | `CHAT_MAX_MESSAGE_SIZE` | `1024` (bytes) |
 * | `CHAT_SEND_BUFFER` | `256` (envelopes) |
 *
 * # Error Handling
 *
 * Unlike optional integrations, chat cannot run without its database, so
 * a missing secret, a bad value or an unreachable database is an error
 * and startup stops.
 */

use std::time::Duration;

use sqlx::SqlitePool;
use thiserror::Error;

use crate::backend::chat::{ChatError, SqliteChatStore};

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing value: {0}")]
    MissingValue(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("invalid chat timing: {0}")]
    InvalidTiming(&'static str),
}

/// Connection tunables for chat sessions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Deadline for writing one frame
    pub write_wait: Duration,
    /// Read deadline; any inbound frame re-arms it
    pub pong_wait: Duration,
    /// Interval between liveness pings, shorter than `pong_wait`
    pub ping_period: Duration,
    /// Largest accepted inbound message, in bytes
    pub max_message_size: usize,
    /// Capacity of each session's outbound queue
    pub send_buffer: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_period: pong_wait * 9 / 10,
            max_message_size: 1024,
            send_buffer: 256,
        }
    }
}

impl ChatConfig {
    /// Create a new ChatConfigBuilder
    pub fn builder() -> ChatConfigBuilder {
        ChatConfigBuilder::default()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_wait.is_zero() || self.pong_wait.is_zero() || self.ping_period.is_zero() {
            return Err(ConfigError::InvalidTiming("durations must be non-zero"));
        }
        if self.ping_period >= self.pong_wait {
            return Err(ConfigError::InvalidTiming(
                "ping period must be shorter than pong wait",
            ));
        }
        if self.send_buffer == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHAT_SEND_BUFFER",
                value: "0".to_string(),
            });
        }
        if self.max_message_size == 0 {
            return Err(ConfigError::InvalidValue {
                name: "CHAT_MAX_MESSAGE_SIZE",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for ChatConfig
///
/// Setting `pong_wait` without `ping_period` derives the ping period as
/// 9/10 of the pong wait.
#[derive(Debug, Default)]
pub struct ChatConfigBuilder {
    write_wait: Option<Duration>,
    pong_wait: Option<Duration>,
    ping_period: Option<Duration>,
    max_message_size: Option<usize>,
    send_buffer: Option<usize>,
}

impl ChatConfigBuilder {
    pub fn write_wait(mut self, value: Duration) -> Self {
        self.write_wait = Some(value);
        self
    }

    pub fn pong_wait(mut self, value: Duration) -> Self {
        self.pong_wait = Some(value);
        self
    }

    pub fn ping_period(mut self, value: Duration) -> Self {
        self.ping_period = Some(value);
        self
    }

    pub fn max_message_size(mut self, value: usize) -> Self {
        self.max_message_size = Some(value);
        self
    }

    pub fn send_buffer(mut self, value: usize) -> Self {
        self.send_buffer = Some(value);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<ChatConfig, ConfigError> {
        let defaults = ChatConfig::default();
        let pong_wait = self.pong_wait.unwrap_or(defaults.pong_wait);

        let config = ChatConfig {
            write_wait: self.write_wait.unwrap_or(defaults.write_wait),
            pong_wait,
            ping_period: self.ping_period.unwrap_or(pong_wait * 9 / 10),
            max_message_size: self.max_message_size.unwrap_or(defaults.max_message_size),
            send_buffer: self.send_buffer.unwrap_or(defaults.send_buffer),
        };
        config.validate()?;
        Ok(config)
    }
}

/// Everything the server needs to start
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub client_origin: String,
    pub chat: ChatConfig,
}

impl ServerConfig {
    /// Read the configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name
    /// to its value
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::MissingValue("JWT_SECRET"))?;

        let mut chat = ChatConfig::builder();
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CHAT_WRITE_WAIT_SECS")? {
            chat = chat.write_wait(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CHAT_PONG_WAIT_SECS")? {
            chat = chat.pong_wait(Duration::from_secs(secs));
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "CHAT_PING_PERIOD_SECS")? {
            chat = chat.ping_period(Duration::from_secs(secs));
        }
        if let Some(size) = parse_var(&lookup, "CHAT_MAX_MESSAGE_SIZE")? {
            chat = chat.max_message_size(size);
        }
        if let Some(capacity) = parse_var(&lookup, "CHAT_SEND_BUFFER")? {
            chat = chat.send_buffer(capacity);
        }

        Ok(Self {
            port: parse_var(&lookup, "SERVER_PORT")?.unwrap_or(8080),
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "sqlite://nhcommunity.db".to_string()),
            jwt_secret,
            client_origin: lookup("CLIENT_ORIGIN")
                .unwrap_or_else(|| "http://localhost:3000".to_string()),
            chat: chat.build()?,
        })
    }

    /// Configuration for tests and local tools: in-memory database, fixed secret
    pub fn for_testing(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
            jwt_secret: jwt_secret.into(),
            client_origin: "http://localhost:3000".to_string(),
            chat: ChatConfig::default(),
        }
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value }),
    }
}

/// Open the chat database and bring its schema up to date
///
/// This function:
/// 1. Connects to `database_url` (SQLite, created if missing)
/// 2. Runs database migrations
pub async fn load_database(database_url: &str) -> Result<SqlitePool, ChatError> {
    tracing::info!("Connecting to database...");
    let store = if database_url.contains(":memory:") {
        SqliteChatStore::in_memory().await?
    } else {
        let store = SqliteChatStore::connect(database_url).await?;
        tracing::info!("Running database migrations...");
        store.migrate().await?;
        store
    };
    tracing::info!("Database ready");

    Ok(store.pool().clone())
}
