//! Core domain models for the chat relay.

use serde::{Deserialize, Serialize};

use super::value_object::{ConnectionId, MessageBody, RoomKey, Timestamp, Username};

/// A chat message posted to a room.
///
/// Immutable once created. Within a room, messages are ordered by
/// `timestamp` and then by insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author's display name at the time of sending
    pub username: Username,
    /// Room the message was posted to
    pub room: RoomKey,
    /// Message text
    pub body: MessageBody,
    /// Server-assigned time of receipt
    pub timestamp: Timestamp,
}

impl Message {
    /// Create a new message
    pub fn new(username: Username, room: RoomKey, body: MessageBody, timestamp: Timestamp) -> Self {
        Self {
            username,
            room,
            body,
            timestamp,
        }
    }
}

/// State of one live connection.
///
/// A session belongs to at most one room at a time. `username` and
/// `current_room` are both unset until the first successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub connection_id: ConnectionId,
    pub username: Option<Username>,
    pub current_room: Option<RoomKey>,
    /// Timestamp when the connection was accepted
    pub connected_at: Timestamp,
}

impl Session {
    /// Create a session that has not joined any room yet
    pub fn new(connection_id: ConnectionId, connected_at: Timestamp) -> Self {
        Self {
            connection_id,
            username: None,
            current_room: None,
            connected_at,
        }
    }

    /// Username and room, when the session has joined a room.
    pub fn membership(&self) -> Option<(&Username, &RoomKey)> {
        match (&self.username, &self.current_room) {
            (Some(username), Some(room)) => Some((username, room)),
            _ => None,
        }
    }
}
