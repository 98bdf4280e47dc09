/**
 * API Route Handlers
 *
 * Chat REST endpoints. Every route added here is wrapped by
 * `auth_middleware` in `router.rs`.
 *
 * # Routes
 *
 * - `GET  /api/conversations` - Conversations of the current user
 * - `GET  /api/conversations/{conversation_id}/messages` - Message history
 * - `POST /api/conversations/{conversation_id}/read` - Mark messages read
 * - `POST /api/chats` - Get or create a direct conversation
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::chat::handlers::{create_chat, list_conversations, list_messages, mark_read};
use crate::backend::server::state::AppState;

/// Add the chat REST routes to `router`
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/conversations", get(list_conversations))
        .route("/api/conversations/{conversation_id}/messages", get(list_messages))
        .route("/api/conversations/{conversation_id}/read", post(mark_read))
        .route("/api/chats", post(create_chat))
}
