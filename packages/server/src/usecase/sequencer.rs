//! Per-room sequencing point.
//!
//! Persisting a message and fanning it out, and joining a room and replaying
//! its history, each run while holding the room's turn. A message is then
//! either part of a joiner's replay or delivered to them live, never both.

use std::{
    collections::{BTreeSet, HashMap},
    sync::{Arc, Mutex as StdMutex, PoisonError},
};

use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::RoomKey;

/// Hands out one turn per room at a time.
///
/// Entries exist only while a turn is held or awaited.
#[derive(Default)]
pub struct RoomSequencer {
    turns: StdMutex<HashMap<RoomKey, Slot>>,
}

struct Slot {
    lock: Arc<Mutex<()>>,
    /// Turns holding or awaiting `lock`. Only changed under the map lock.
    users: usize,
}

impl RoomSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `room`.
    pub async fn acquire(&self, room: &RoomKey) -> RoomTurn<'_> {
        let lock = {
            let mut turns = self.turns.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = turns.entry(room.clone()).or_insert_with(|| Slot {
                lock: Arc::default(),
                users: 0,
            });
            slot.users += 1;
            slot.lock.clone()
        };

        // Built before awaiting so a cancelled waiter still checks out.
        let mut turn = RoomTurn {
            sequencer: self,
            room: room.clone(),
            guard: None,
        };
        turn.guard = Some(lock.lock_owned().await);
        turn
    }

    /// Wait for exclusive access to every room in `rooms`.
    ///
    /// Turns are taken in key order, so two callers locking overlapping
    /// sets cannot deadlock. Duplicates are locked once.
    pub async fn acquire_all<'r>(
        &self,
        rooms: impl IntoIterator<Item = &'r RoomKey>,
    ) -> Vec<RoomTurn<'_>> {
        let ordered: BTreeSet<&RoomKey> = rooms.into_iter().collect();
        let mut turns = Vec::with_capacity(ordered.len());
        for room in ordered {
            turns.push(self.acquire(room).await);
        }
        turns
    }

    /// Number of rooms with a turn currently held or awaited.
    pub fn active_rooms(&self) -> usize {
        self.turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one room, released on drop.
pub struct RoomTurn<'a> {
    sequencer: &'a RoomSequencer,
    room: RoomKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl RoomTurn<'_> {
    pub fn room(&self) -> &RoomKey {
        &self.room
    }
}

impl Drop for RoomTurn<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());

        let mut turns = self
            .sequencer
            .turns
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(slot) = turns.get_mut(&self.room) {
            slot.users = slot.users.saturating_sub(1);
            if slot.users == 0 {
                turns.remove(&self.room);
            }
        }
    }
}
