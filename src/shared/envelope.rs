/**
 * Chat Wire Envelope
 *
 * Every WebSocket frame on the chat connection carries one `Envelope`:
 * a type tag, a tag-dependent payload and a server-assigned timestamp.
 *
 * ```json
 * { "type": "private_message",
 *   "payload": { "recipientId": 2, "content": "hi" },
 *   "timestamp": "2025-01-01T00:00:00Z" }
 * ```
 *
 * Inbound frames use `private_message`; the server answers recipients with
 * `incoming_private_message` carrying the stored `ChatMessage`. Any other
 * tag decodes to `EnvelopeKind::Unknown` and is ignored by the session.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::shared::error::SharedError;
use crate::shared::messaging::{ChatMessage, UserId};

/// Type tag of an envelope
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnvelopeKind {
    /// Client to server: send a direct message
    PrivateMessage,
    /// Server to client: a direct message was stored for you
    IncomingPrivateMessage,
    /// Any tag this server does not know about
    #[serde(other)]
    Unknown,
}

/// A tagged wire message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Discriminates the payload shape
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    /// Tag-dependent payload
    #[serde(default)]
    pub payload: serde_json::Value,
    /// Assigned by the server, never taken from the client
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    /// Create a new envelope stamped with the current time
    pub fn new(kind: EnvelopeKind, payload: serde_json::Value) -> Self {
        Self {
            kind,
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Decode an inbound frame.
    ///
    /// Whatever timestamp the client sent is replaced by the receive time.
    pub fn decode(frame: &[u8]) -> Result<Self, SharedError> {
        let mut envelope: Envelope = serde_json::from_slice(frame)?;
        envelope.timestamp = Utc::now();
        Ok(envelope)
    }

    /// Encode for an outbound text frame
    pub fn encode(&self) -> Result<String, SharedError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Wrap a stored message for delivery to its recipient
    pub fn incoming_private_message(message: &ChatMessage) -> Result<Self, SharedError> {
        let payload = serde_json::to_value(message)?;
        Ok(Self::new(EnvelopeKind::IncomingPrivateMessage, payload))
    }

    /// Decode the payload of a `private_message` envelope
    pub fn private_message_payload(&self) -> Result<PrivateMessagePayload, SharedError> {
        let payload: PrivateMessagePayload = serde_json::from_value(self.payload.clone())?;
        payload.validate()?;
        Ok(payload)
    }
}

/// Payload of a `private_message` envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PrivateMessagePayload {
    pub recipient_id: UserId,
    pub content: String,
}

impl PrivateMessagePayload {
    fn validate(&self) -> Result<(), SharedError> {
        if self.content.trim().is_empty() {
            return Err(SharedError::validation(
                "content",
                "message content cannot be empty",
            ));
        }
        Ok(())
    }
}
