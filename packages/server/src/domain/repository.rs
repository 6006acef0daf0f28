//! Collaborator interfaces owned by the domain.
//!
//! The use case layer depends on these traits; concrete implementations
//! live in `infrastructure` (dependency inversion).

use async_trait::async_trait;

use super::{
    entity::{Message, Session},
    error::{RegistryError, RepositoryError},
    event::Outbound,
    value_object::{ConnectionId, MessageBody, RoomKey, Timestamp, Username},
};

/// Durable, append-only message store.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Persist a new message and return it.
    async fn create(
        &self,
        username: Username,
        room: RoomKey,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<Message, RepositoryError>;

    /// All messages of `room`, oldest first (insertion order breaks ties).
    async fn find_by_room(&self, room: &RoomKey) -> Result<Vec<Message>, RepositoryError>;
}

/// In-memory mapping of live connections to rooms.
///
/// Invariant: a connection appears in a room's member set exactly when its
/// session's `current_room` is that room.
#[async_trait]
pub trait RoomRegistry: Send + Sync {
    /// Register a freshly accepted connection with no room.
    async fn register(
        &self,
        connection_id: ConnectionId,
        outbound: Outbound,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError>;

    /// Move `connection_id` into `room` under `username`.
    ///
    /// Leaves the previous room, if any, and returns it. Joining the room
    /// the connection is already in only updates the username.
    async fn join(
        &self,
        connection_id: &ConnectionId,
        username: Username,
        room: RoomKey,
    ) -> Result<Option<RoomKey>, RegistryError>;

    /// Leave the current room. No-op for unknown or roomless connections.
    async fn leave(&self, connection_id: &ConnectionId) -> Option<RoomKey>;

    /// Leave the current room and discard the session.
    ///
    /// Returns the removed session; `None` if it was already gone.
    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Session>;

    async fn session(&self, connection_id: &ConnectionId) -> Option<Session>;

    /// Snapshot of the live members of `room`.
    async fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId>;

    /// Same snapshot as [`members_of`](Self::members_of), paired with each
    /// member's outbound queue.
    async fn recipients_of(&self, room: &RoomKey) -> Vec<(ConnectionId, Outbound)>;

    async fn outbound_of(&self, connection_id: &ConnectionId) -> Option<Outbound>;

    /// Live rooms with their member counts, sorted by key.
    async fn rooms(&self) -> Vec<(RoomKey, usize)>;

    async fn room_count(&self) -> usize;

    async fn connection_count(&self) -> usize;
}
