//! WebSocket message DTOs for the chat relay.
//!
//! Every frame is a JSON text frame tagged by `type`.

use serde::{Deserialize, Serialize};

use roomcast_shared::time::timestamp_to_rfc3339;

use crate::domain::{Message, OutboundEvent};

/// Frames sent by clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Join (or switch to) a room. Missing fields are treated as empty and
    /// rejected by validation.
    JoinRoom {
        #[serde(default)]
        username: String,
        #[serde(default)]
        room: String,
    },
    /// Post to the current room
    ChatMessage {
        #[serde(default)]
        body: String,
    },
}

/// Outbound message type enum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum MessageType {
    Message,
    Error,
}

/// Chat message as seen by clients, for both history replay and live
/// broadcast. The domain `body` is exposed as `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagePayload {
    pub r#type: MessageType,
    pub username: String,
    pub room: String,
    pub message: String,
    /// RFC 3339, UTC
    pub time: String,
}

impl From<&Message> for MessagePayload {
    fn from(message: &Message) -> Self {
        Self {
            r#type: MessageType::Message,
            username: message.username.as_str().to_string(),
            room: message.room.as_str().to_string(),
            message: message.body.as_str().to_string(),
            time: timestamp_to_rfc3339(message.timestamp.value()),
        }
    }
}

/// Rejection notice sent to the offending connection only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorPayload {
    pub r#type: MessageType,
    /// `invalidInput`, `notJoined` or `persistenceError`
    pub code: String,
    pub reason: String,
}

/// Serialize an outbound event into a text frame.
pub fn encode(event: &OutboundEvent) -> Result<String, serde_json::Error> {
    match event {
        OutboundEvent::Message(message) => serde_json::to_string(&MessagePayload::from(message)),
        OutboundEvent::Error { kind, reason } => serde_json::to_string(&ErrorPayload {
            r#type: MessageType::Error,
            code: kind.to_string(),
            reason: reason.clone(),
        }),
    }
}
