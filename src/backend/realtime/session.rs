/**
 * Client Session
 *
 * One authenticated WebSocket connection, driven by two cooperating tasks:
 *
 * - The **read pump** runs on the upgrade task. It decodes inbound frames,
 *   stores private messages through the chat service and hands the stored
 *   message to the hub for delivery.
 * - The **write pump** is spawned. It drains the session's outbound queue,
 *   writes each envelope as a text frame and sends a ping every
 *   `ping_period`.
 *
 * The pumps share nothing but the queue (hub to writer) and a oneshot that
 * tells the reader when the writer has stopped.
 *
 * # Teardown
 *
 * Whatever ends the read pump (close frame, read error, read deadline,
 * writer gone) drops its `Registration`, which unregisters the session
 * exactly once. The hub then drops the queue sender, the write pump sees
 * the queue close, sends a close frame and closes the sink.
 */

use std::fmt::Display;

use axum::extract::ws::{Message, WebSocket};
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::{mpsc, oneshot};
use tokio::time::{interval_at, timeout, Instant, MissedTickBehavior};

use super::hub::Hub;
use super::registry::{SessionHandle, SessionId};
use crate::backend::chat::{ChatError, SharedChatService};
use crate::backend::server::config::ChatConfig;
use crate::shared::{Envelope, EnvelopeKind, NewMessage, UserId};

/// A chat connection for one user
pub struct ClientSession {
    user_id: UserId,
    hub: Hub,
    chat: SharedChatService,
    config: ChatConfig,
}

impl ClientSession {
    pub fn new(user_id: UserId, hub: Hub, chat: SharedChatService, config: ChatConfig) -> Self {
        Self {
            user_id,
            hub,
            chat,
            config,
        }
    }

    /// Run the session over an upgraded axum WebSocket until it closes
    pub async fn serve(self, socket: WebSocket) {
        let (sink, stream) = socket.split();
        self.run(stream, sink).await;
    }

    /// Run the session over any frame stream and sink.
    ///
    /// Returns once both pumps have stopped and the session is unregistered.
    pub async fn run<St, Si, E>(self, stream: St, sink: Si)
    where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
        Si: Sink<Message> + Unpin + Send + 'static,
        Si::Error: Display,
    {
        let (handle, outbound) = SessionHandle::new(self.user_id, self.config.send_buffer);
        let session_id = handle.id();
        tracing::info!(user_id = self.user_id, session_id = %session_id, "Chat session opened");

        self.hub.register(handle);
        let registration = Registration {
            hub: self.hub.clone(),
            user_id: self.user_id,
            session_id,
        };

        let (writer_done, writer_stopped) = oneshot::channel();
        let mut writer = tokio::spawn(write_pump(
            sink,
            outbound,
            self.config.clone(),
            writer_done,
            self.user_id,
            session_id,
        ));

        self.read_pump(stream, writer_stopped, session_id).await;

        drop(registration);
        if timeout(self.config.write_wait * 2, &mut writer).await.is_err() {
            tracing::warn!(user_id = self.user_id, session_id = %session_id, "Write pump did not stop, aborting");
            writer.abort();
        }

        tracing::info!(user_id = self.user_id, session_id = %session_id, "Chat session closed");
    }

    async fn read_pump<St, E>(
        &self,
        mut stream: St,
        mut writer_stopped: oneshot::Receiver<()>,
        session_id: SessionId,
    ) where
        St: Stream<Item = Result<Message, E>> + Unpin,
        E: Display,
    {
        loop {
            let next = tokio::select! {
                _ = &mut writer_stopped => {
                    tracing::debug!(session_id = %session_id, "Write pump stopped, ending read pump");
                    break;
                }
                next = timeout(self.config.pong_wait, stream.next()) => next,
            };

            let frame = match next {
                Err(_) => {
                    tracing::info!(user_id = self.user_id, session_id = %session_id, "Read deadline exceeded");
                    break;
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    tracing::debug!(session_id = %session_id, "Read error: {}", e);
                    break;
                }
                Ok(Some(Ok(frame))) => frame,
            };

            match frame {
                Message::Text(text) => self.handle_frame(text.as_str().as_bytes(), session_id).await,
                Message::Binary(data) => self.handle_frame(&data, session_id).await,
                Message::Close(_) => break,
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    }

    async fn handle_frame(&self, frame: &[u8], session_id: SessionId) {
        let envelope = match Envelope::decode(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(user_id = self.user_id, session_id = %session_id, "Dropping malformed frame: {}", e);
                return;
            }
        };

        match envelope.kind {
            EnvelopeKind::PrivateMessage => {
                if let Err(e) = self.handle_private_message(&envelope).await {
                    match e {
                        ChatError::Database(_) | ChatError::Migration(_) => {
                            tracing::error!(user_id = self.user_id, "Failed to store private message: {}", e)
                        }
                        _ => tracing::warn!(user_id = self.user_id, "Dropping private message: {}", e),
                    }
                }
            }
            kind => {
                tracing::debug!(session_id = %session_id, ?kind, "Ignoring envelope");
            }
        }
    }

    async fn handle_private_message(&self, envelope: &Envelope) -> Result<(), ChatError> {
        let payload = envelope.private_message_payload()?;
        if payload.recipient_id == self.user_id {
            return Err(ChatError::SelfConversation);
        }

        let conversation = self
            .chat
            .get_or_create_conversation(self.user_id, payload.recipient_id)
            .await?;
        let message = self
            .chat
            .create_message(NewMessage::new(conversation.id, self.user_id, payload.content)?)
            .await?;

        tracing::debug!(
            message_id = message.id,
            conversation_id = conversation.id,
            sender_id = self.user_id,
            recipient_id = payload.recipient_id,
            "Private message stored"
        );

        let outgoing = Envelope::incoming_private_message(&message)?;
        self.hub.forward_private_message(outgoing, payload.recipient_id);
        Ok(())
    }
}

/// Unregisters the session when dropped
struct Registration {
    hub: Hub,
    user_id: UserId,
    session_id: SessionId,
}

impl Drop for Registration {
    fn drop(&mut self) {
        self.hub.unregister(self.user_id, self.session_id);
    }
}

async fn write_pump<Si>(
    mut sink: Si,
    mut outbound: mpsc::Receiver<Envelope>,
    config: ChatConfig,
    _done: oneshot::Sender<()>,
    user_id: UserId,
    session_id: SessionId,
) where
    Si: Sink<Message> + Unpin,
    Si::Error: Display,
{
    let mut ticker = interval_at(Instant::now() + config.ping_period, config.ping_period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            next = outbound.recv() => match next {
                Some(envelope) => match envelope.encode() {
                    Ok(text) => Message::Text(text.into()),
                    Err(e) => {
                        tracing::warn!(session_id = %session_id, "Failed to encode envelope: {}", e);
                        continue;
                    }
                },
                None => {
                    // Unregistered or evicted
                    let _ = timeout(config.write_wait, sink.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ticker.tick() => Message::Ping(Bytes::new()),
        };

        match timeout(config.write_wait, sink.send(frame)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(user_id, session_id = %session_id, "Write failed: {}", e);
                break;
            }
            Err(_) => {
                tracing::info!(user_id, session_id = %session_id, "Write deadline exceeded");
                break;
            }
        }
    }

    let _ = timeout(config.write_wait, sink.close()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::chat::{ChatService, SqliteChatStore};
    use crate::shared::messaging::{ChatMessage, Conversation, ConversationId};
    use async_trait::async_trait;
    use futures::channel::mpsc as frames;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::task::{Context, Poll};
    use std::time::Duration;

    type Inbound = frames::UnboundedSender<Result<Message, axum::Error>>;
    type Outbound = frames::UnboundedReceiver<Message>;

    fn start(
        user_id: UserId,
        hub: &Hub,
        chat: SharedChatService,
        config: ChatConfig,
    ) -> (Inbound, Outbound, tokio::task::JoinHandle<()>) {
        let (inbound_tx, inbound_rx) = frames::unbounded();
        let (outbound_tx, outbound_rx) = frames::unbounded();
        let session = ClientSession::new(user_id, hub.clone(), chat, config);
        let task = tokio::spawn(session.run(inbound_rx, outbound_tx));
        (inbound_tx, outbound_rx, task)
    }

    fn text(value: serde_json::Value) -> Result<Message, axum::Error> {
        Ok(Message::Text(value.to_string().into()))
    }

    async fn wait_for_sessions(hub: &Hub, user_id: UserId, expected: usize) {
        for _ in 0..100 {
            if hub.session_count(user_id).await == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("user {} never reached {} sessions", user_id, expected);
    }

    #[tokio::test]
    async fn test_private_message_is_stored_and_forwarded() {
        let hub = Hub::spawn();
        let store = Arc::new(SqliteChatStore::in_memory().await.unwrap());
        let (recipient, mut recipient_rx) = SessionHandle::new(2, 8);
        hub.register(recipient);

        let (inbound, _outbound, _task) = start(1, &hub, store.clone(), ChatConfig::default());
        inbound
            .unbounded_send(text(serde_json::json!({
                "type": "private_message",
                "payload": { "recipientId": 2, "content": "hi" }
            })))
            .unwrap();

        let delivered = recipient_rx.recv().await.unwrap();
        assert_eq!(delivered.kind, EnvelopeKind::IncomingPrivateMessage);
        let message: ChatMessage = serde_json::from_value(delivered.payload).unwrap();
        assert_eq!(message.sender_id, 1);
        assert_eq!(message.content, "hi");

        let stored = store.get_messages(message.conversation_id, 50, 0).await.unwrap();
        assert_eq!(stored, vec![message]);
    }

    #[tokio::test]
    async fn test_malformed_frame_keeps_session_alive() {
        let hub = Hub::spawn();
        let store = Arc::new(SqliteChatStore::in_memory().await.unwrap());
        let (recipient, mut recipient_rx) = SessionHandle::new(2, 8);
        hub.register(recipient);

        let (inbound, _outbound, _task) = start(1, &hub, store, ChatConfig::default());
        inbound
            .unbounded_send(Ok(Message::Text("{ not json".into())))
            .unwrap();
        inbound
            .unbounded_send(text(serde_json::json!({ "type": "typing", "payload": {} })))
            .unwrap();
        inbound
            .unbounded_send(text(serde_json::json!({
                "type": "private_message",
                "payload": { "recipientId": 2, "content": "still here" }
            })))
            .unwrap();

        let delivered = recipient_rx.recv().await.unwrap();
        assert_eq!(delivered.payload["content"], "still here");
        assert_eq!(hub.session_count(1).await, 1);
    }

    #[tokio::test]
    async fn test_close_frame_unregisters_and_closes_sink() {
        let hub = Hub::spawn();
        let store = Arc::new(SqliteChatStore::in_memory().await.unwrap());

        let (inbound, mut outbound, task) = start(1, &hub, store, ChatConfig::default());
        wait_for_sessions(&hub, 1, 1).await;

        inbound.unbounded_send(Ok(Message::Close(None))).unwrap();
        task.await.unwrap();

        assert_eq!(hub.session_count(1).await, 0);
        let frames: Vec<Message> = outbound.by_ref().collect().await;
        assert_eq!(frames, vec![Message::Close(None)]);
    }

    #[tokio::test]
    async fn test_self_message_is_dropped() {
        let hub = Hub::spawn();
        let store = Arc::new(SqliteChatStore::in_memory().await.unwrap());

        let (inbound, _outbound, task) = start(1, &hub, store.clone(), ChatConfig::default());
        inbound
            .unbounded_send(text(serde_json::json!({
                "type": "private_message",
                "payload": { "recipientId": 1, "content": "me" }
            })))
            .unwrap();
        drop(inbound);
        task.await.unwrap();

        assert!(store.get_conversations_for_user(1).await.unwrap().is_empty());
    }

    /// Storage that is never reached; timing tests run on paused time
    struct UnusedChat;

    #[async_trait]
    impl ChatService for UnusedChat {
        async fn get_or_create_conversation(
            &self,
            _: UserId,
            _: UserId,
        ) -> Result<Conversation, ChatError> {
            Err(ChatError::SelfConversation)
        }

        async fn create_message(&self, message: NewMessage) -> Result<ChatMessage, ChatError> {
            Err(ChatError::ConversationNotFound(message.conversation_id))
        }

        async fn get_conversations_for_user(
            &self,
            _: UserId,
        ) -> Result<Vec<Conversation>, ChatError> {
            Ok(Vec::new())
        }

        async fn get_messages(
            &self,
            _: ConversationId,
            _: u32,
            _: u32,
        ) -> Result<Vec<ChatMessage>, ChatError> {
            Ok(Vec::new())
        }

        async fn is_participant(&self, _: ConversationId, _: UserId) -> Result<bool, ChatError> {
            Ok(false)
        }

        async fn mark_conversation_read(
            &self,
            _: ConversationId,
            _: UserId,
        ) -> Result<u64, ChatError> {
            Ok(0)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pings_then_read_deadline() {
        let hub = Hub::spawn();
        let config = ChatConfig::builder()
            .write_wait(Duration::from_secs(1))
            .pong_wait(Duration::from_secs(3))
            .ping_period(Duration::from_secs(1))
            .build()
            .unwrap();

        let (_inbound, mut outbound, task) = start(1, &hub, Arc::new(UnusedChat), config);

        assert_eq!(outbound.next().await, Some(Message::Ping(Bytes::new())));

        task.await.unwrap();
        assert_eq!(hub.session_count(1).await, 0);

        let rest: Vec<Message> = outbound.collect().await;
        assert_eq!(rest.last(), Some(&Message::Close(None)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_inbound_pong_extends_deadline() {
        let hub = Hub::spawn();
        let config = ChatConfig::builder()
            .write_wait(Duration::from_secs(1))
            .pong_wait(Duration::from_secs(3))
            .ping_period(Duration::from_secs(2))
            .build()
            .unwrap();

        let (inbound, _outbound, task) = start(1, &hub, Arc::new(UnusedChat), config);

        for _ in 0..3 {
            tokio::time::sleep(Duration::from_secs(2)).await;
            inbound.unbounded_send(Ok(Message::Pong(Bytes::new()))).unwrap();
        }
        assert_eq!(hub.session_count(1).await, 1);

        drop(inbound);
        task.await.unwrap();
        assert_eq!(hub.session_count(1).await, 0);
    }

    /// Sink that accepts nothing and never finishes a write
    struct StalledSink;

    impl Sink<Message> for StalledSink {
        type Error = axum::Error;

        fn poll_ready(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn start_send(self: Pin<&mut Self>, _: Message) -> Result<(), Self::Error> {
            Ok(())
        }

        fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }

        fn poll_close(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
            Poll::Pending
        }
    }

    fn liveness_config() -> ChatConfig {
        ChatConfig::builder()
            .write_wait(Duration::from_secs(1))
            .pong_wait(Duration::from_secs(30))
            .ping_period(Duration::from_secs(1))
            .build()
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_failure_tears_down_session() {
        let hub = Hub::spawn();
        let (_inbound, outbound, task) = start(1, &hub, Arc::new(UnusedChat), liveness_config());
        wait_for_sessions(&hub, 1, 1).await;

        // The peer is gone: the next ping write fails
        drop(outbound);

        // Well inside the read deadline, so only the writer can have ended the reader
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .expect("session outlived its write pump")
            .unwrap();
        assert_eq!(hub.session_count(1).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_deadline_tears_down_session() {
        let hub = Hub::spawn();
        let (_inbound, inbound_rx) = frames::unbounded::<Result<Message, axum::Error>>();
        let session = ClientSession::new(1, hub.clone(), Arc::new(UnusedChat), liveness_config());
        let task = tokio::spawn(session.run(inbound_rx, StalledSink));
        wait_for_sessions(&hub, 1, 1).await;

        tokio::time::timeout(Duration::from_secs(10), task)
            .await
            .expect("session outlived its stalled write pump")
            .unwrap();
        assert_eq!(hub.session_count(1).await, 0);
    }
}
