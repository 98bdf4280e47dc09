/**
 * Chat Socket Subscription Handler
 *
 * `GET /api/ws/chat` upgrades the request to a WebSocket and hands it to a
 * [`ClientSession`].
 *
 * # Authentication
 *
 * The JWT is taken from `Authorization: Bearer <token>` or, because
 * browsers cannot set headers on a WebSocket handshake, from
 * `?token=<token>`. A request without a valid token is still upgraded,
 * then receives a close frame (1008, "Unauthorized") and is closed. It is
 * never registered with the hub.
 *
 * # Limits
 *
 * Inbound messages larger than `max_message_size` bytes are rejected by
 * the WebSocket layer and end the connection.
 */

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::Response,
};
use futures::SinkExt;
use serde::Deserialize;

use super::session::ClientSession;
use crate::backend::middleware::auth::{authenticate, bearer_token};
use crate::backend::server::state::AppState;

/// Query string accepted by the chat socket
#[derive(Debug, Default, Deserialize)]
pub struct ChatSocketQuery {
    pub token: Option<String>,
}

/// Handle chat socket upgrade (GET /api/ws/chat)
pub async fn handle_chat_socket(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ChatSocketQuery>,
) -> Response {
    let token = bearer_token(&headers)
        .map(str::to_owned)
        .or(query.token);

    let user = token
        .as_deref()
        .and_then(|token| authenticate(&state.config.jwt_secret, token).ok());

    let chat_config = state.config.chat.clone();
    let ws = ws.max_message_size(chat_config.max_message_size);

    match user {
        Some(user) => {
            tracing::debug!(user_id = user.user_id, "Upgrading chat socket");
            let session = ClientSession::new(user.user_id, state.hub, state.chat, chat_config);
            ws.on_upgrade(move |socket| session.serve(socket))
        }
        None => {
            tracing::warn!("Rejecting unauthenticated chat socket");
            ws.on_upgrade(reject_unauthorized)
        }
    }
}

async fn reject_unauthorized(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "Unauthorized".into(),
    };
    if socket.send(Message::Close(Some(frame))).await.is_ok() {
        let _ = socket.close().await;
    }
}
