/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * `AppState` holds:
 * - The chat service (SQLite store behind `Arc<dyn ChatService>`)
 * - The hub handle used by every chat socket
 * - The server configuration (JWT secret, chat tunables)
 *
 * # Thread Safety
 *
 * Every field is cheap to clone and safe to share:
 * - `Arc<dyn ChatService>` where the trait is `Send + Sync`
 * - `Hub` wraps an unbounded sender to the hub task
 * - `Arc<ServerConfig>` is read-only after startup
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers ask for only what they use:
 *
 * ```rust,no_run
 * use axum::extract::State;
 * use nhcommunity::backend::chat::SharedChatService;
 *
 * async fn handler(State(chat): State<SharedChatService>) {
 *     // Use chat
 * }
 * ```
 */

use axum::extract::FromRef;
use std::sync::Arc;

use crate::backend::chat::SharedChatService;
use crate::backend::realtime::Hub;
use crate::backend::server::config::ServerConfig;

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// Conversation and message storage
    pub chat: SharedChatService,

    /// Handle to the hub task routing envelopes between sessions
    pub hub: Hub,

    /// Configuration loaded at startup
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(chat: SharedChatService, hub: Hub, config: ServerConfig) -> Self {
        Self {
            chat,
            hub,
            config: Arc::new(config),
        }
    }
}

impl FromRef<AppState> for SharedChatService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.chat.clone()
    }
}

impl FromRef<AppState> for Hub {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for Arc<ServerConfig> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config.clone()
    }
}
