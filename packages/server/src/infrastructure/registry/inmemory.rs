//! InMemory Room Registry 実装
//!
//! ドメイン層が定義する RoomRegistry trait の具体的な実装。
//! セッション表とルーム表を 1 つの Mutex で守り、両者を常に同期させます。

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    ConnectionId, Outbound, RegistryError, RoomKey, RoomRegistry, Session, Timestamp, Username,
};

struct SessionEntry {
    session: Session,
    outbound: Outbound,
}

impl SessionEntry {
    fn is_live(&self) -> bool {
        !self.outbound.is_closed()
    }
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<ConnectionId, SessionEntry>,
    rooms: HashMap<RoomKey, HashSet<ConnectionId>>,
}

impl Inner {
    /// Remove `connection_id` from its current room, dropping the room once
    /// it has no members left.
    fn detach(&mut self, connection_id: &ConnectionId) -> Option<RoomKey> {
        let entry = self.sessions.get_mut(connection_id)?;
        let room = entry.session.current_room.take()?;

        if let Some(members) = self.rooms.get_mut(&room) {
            members.remove(connection_id);
            if members.is_empty() {
                self.rooms.remove(&room);
                tracing::debug!("Room '{}' is empty and was dropped", room);
            }
        }

        Some(room)
    }

    fn live_members(&self, room: &RoomKey) -> Vec<(&ConnectionId, &SessionEntry)> {
        let Some(members) = self.rooms.get(room) else {
            return Vec::new();
        };

        let mut live: Vec<_> = members
            .iter()
            .filter_map(|id| self.sessions.get(id).map(|entry| (id, entry)))
            .filter(|(_, entry)| entry.is_live())
            .collect();
        live.sort_by(|a, b| a.0.as_str().cmp(b.0.as_str()));
        live
    }
}

/// インメモリ Room Registry 実装
///
/// All reads and writes go through one lock. Callers never hold it across
/// storage I/O; fan-out works on the snapshots returned here.
#[derive(Default)]
pub struct InMemoryRoomRegistry {
    inner: Mutex<Inner>,
}

impl InMemoryRoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRegistry for InMemoryRoomRegistry {
    async fn register(
        &self,
        connection_id: ConnectionId,
        outbound: Outbound,
        connected_at: Timestamp,
    ) -> Result<(), RegistryError> {
        let mut inner = self.inner.lock().await;
        if inner.sessions.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(
                connection_id.as_str().to_string(),
            ));
        }

        let session = Session::new(connection_id.clone(), connected_at);
        inner
            .sessions
            .insert(connection_id, SessionEntry { session, outbound });
        Ok(())
    }

    async fn join(
        &self,
        connection_id: &ConnectionId,
        username: Username,
        room: RoomKey,
    ) -> Result<Option<RoomKey>, RegistryError> {
        let mut inner = self.inner.lock().await;

        let already_there = {
            let entry = inner
                .sessions
                .get_mut(connection_id)
                .ok_or_else(|| RegistryError::UnknownConnection(connection_id.to_string()))?;
            entry.session.username = Some(username);
            entry.session.current_room.as_ref() == Some(&room)
        };
        if already_there {
            return Ok(None);
        }

        let previous = inner.detach(connection_id);
        if let Some(entry) = inner.sessions.get_mut(connection_id) {
            entry.session.current_room = Some(room.clone());
        }
        inner
            .rooms
            .entry(room)
            .or_default()
            .insert(connection_id.clone());

        Ok(previous)
    }

    async fn leave(&self, connection_id: &ConnectionId) -> Option<RoomKey> {
        let mut inner = self.inner.lock().await;
        inner.detach(connection_id)
    }

    async fn unregister(&self, connection_id: &ConnectionId) -> Option<Session> {
        let mut inner = self.inner.lock().await;
        inner.detach(connection_id);
        inner
            .sessions
            .remove(connection_id)
            .map(|entry| entry.session)
    }

    async fn session(&self, connection_id: &ConnectionId) -> Option<Session> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(connection_id)
            .map(|entry| entry.session.clone())
    }

    async fn members_of(&self, room: &RoomKey) -> Vec<ConnectionId> {
        let inner = self.inner.lock().await;
        inner
            .live_members(room)
            .into_iter()
            .map(|(id, _)| id.clone())
            .collect()
    }

    async fn recipients_of(&self, room: &RoomKey) -> Vec<(ConnectionId, Outbound)> {
        let inner = self.inner.lock().await;
        inner
            .live_members(room)
            .into_iter()
            .map(|(id, entry)| (id.clone(), entry.outbound.clone()))
            .collect()
    }

    async fn outbound_of(&self, connection_id: &ConnectionId) -> Option<Outbound> {
        let inner = self.inner.lock().await;
        inner
            .sessions
            .get(connection_id)
            .map(|entry| entry.outbound.clone())
    }

    async fn rooms(&self) -> Vec<(RoomKey, usize)> {
        let inner = self.inner.lock().await;
        let mut rooms: Vec<_> = inner
            .rooms
            .iter()
            .map(|(room, members)| (room.clone(), members.len()))
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        rooms
    }

    async fn room_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.rooms.len()
    }

    async fn connection_count(&self) -> usize {
        let inner = self.inner.lock().await;
        inner.sessions.len()
    }
}
