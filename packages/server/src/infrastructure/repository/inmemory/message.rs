//! InMemory Message Repository 実装
//!
//! ルームごとの Vec をインメモリ DB として使用します。
//! プロセスが終了すると履歴は失われます。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Message, MessageBody, MessageRepository, RepositoryError, RoomKey, Timestamp, Username,
};

/// インメモリ Message Repository 実装
#[derive(Default)]
pub struct InMemoryMessageRepository {
    messages: Mutex<HashMap<RoomKey, Vec<Message>>>,
}

impl InMemoryMessageRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageRepository for InMemoryMessageRepository {
    async fn create(
        &self,
        username: Username,
        room: RoomKey,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<Message, RepositoryError> {
        let message = Message::new(username, room, body, timestamp);
        let mut messages = self.messages.lock().await;
        let history = messages.entry(message.room.clone()).or_default();

        // Appends normally arrive in timestamp order; a late arrival goes
        // after every message with the same or an earlier timestamp.
        let at = history.partition_point(|m| m.timestamp <= message.timestamp);
        history.insert(at, message.clone());

        Ok(message)
    }

    async fn find_by_room(&self, room: &RoomKey) -> Result<Vec<Message>, RepositoryError> {
        let messages = self.messages.lock().await;
        Ok(messages.get(room).cloned().unwrap_or_default())
    }
}
