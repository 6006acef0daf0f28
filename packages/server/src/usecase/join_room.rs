//! UseCase: ルーム参加処理
//!
//! ## 処理の流れ
//! 1. ユーザー名とルーム名を検証する（不正なら InvalidInput）
//! 2. 以前のルームと新しいルームのターンをキー順に取得する
//! 3. Registry 上でルームを移動する（以前のルームからは抜ける）
//! 4. 履歴を取得し、参加者本人の送信キューにだけ古い順に積む
//!
//! ターンを保持したまま 3 と 4 を行うため、同じルームへの送信と混ざって
//! 同じメッセージが履歴とライブ配信の両方で届くことはありません。
//! 以前のルームのターンも保持するので、移動後に以前のルームの配信が届くこともありません。
//! 2 から 4 は別タスクで実行し、呼び出し側が破棄されても途中で止まりません。

use std::sync::Arc;

use crate::domain::{
    ConnectionId, Message, MessageRepository, OutboundEvent, RegistryError, RoomKey, RoomRegistry,
    Username,
};

use super::{detach::run_detached, error::JoinRoomError, sequencer::RoomSequencer};

/// Result of a successful join
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub room: RoomKey,
    /// Room the connection left to join this one
    pub previous_room: Option<RoomKey>,
    /// Number of history messages queued for the joiner
    pub replayed: usize,
}

/// ルーム参加のユースケース
#[derive(Clone)]
pub struct JoinRoomUseCase {
    registry: Arc<dyn RoomRegistry>,
    messages: Arc<dyn MessageRepository>,
    sequencer: Arc<RoomSequencer>,
}

impl JoinRoomUseCase {
    pub fn new(
        registry: Arc<dyn RoomRegistry>,
        messages: Arc<dyn MessageRepository>,
        sequencer: Arc<RoomSequencer>,
    ) -> Self {
        Self {
            registry,
            messages,
            sequencer,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Errors
    ///
    /// * `InvalidInput` - username or room missing / malformed; nothing changes
    /// * `UnknownConnection` - the connection was never registered or is gone
    /// * `Persistence` - joined, but the history could not be read
    /// * `Interrupted` - the runtime shut down mid-join
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        username: String,
        room: String,
    ) -> Result<JoinOutcome, JoinRoomError> {
        let username = Username::new(username)?;
        let room = RoomKey::new(room)?;

        let this = self.clone();
        let connection_id = connection_id.clone();
        run_detached(async move { this.move_and_replay(&connection_id, username, room).await })
            .await
            .unwrap_or(Err(JoinRoomError::Interrupted))
    }

    async fn move_and_replay(
        &self,
        connection_id: &ConnectionId,
        username: Username,
        room: RoomKey,
    ) -> Result<JoinOutcome, JoinRoomError> {
        // Hold the room being left too, so none of its broadcasts land after the move.
        let _turns = loop {
            let current = self.current_room(connection_id).await;
            let turns = self
                .sequencer
                .acquire_all(current.iter().chain([&room]))
                .await;
            if self.current_room(connection_id).await == current {
                break turns;
            }
        };

        let previous_room = self
            .registry
            .join(connection_id, username.clone(), room.clone())
            .await
            .map_err(|e| match e {
                RegistryError::UnknownConnection(id) | RegistryError::DuplicateConnection(id) => {
                    JoinRoomError::UnknownConnection(id)
                }
            })?;

        if let Some(previous) = &previous_room {
            tracing::info!(
                "'{}' ({}) moved from room '{}' to '{}'",
                username,
                connection_id,
                previous,
                room
            );
        } else {
            tracing::info!("'{}' ({}) joined room '{}'", username, connection_id, room);
        }

        let history = self.messages.find_by_room(&room).await?;
        let replayed = self.replay(connection_id, history).await;

        Ok(JoinOutcome {
            room,
            previous_room,
            replayed,
        })
    }

    async fn current_room(&self, connection_id: &ConnectionId) -> Option<RoomKey> {
        self.registry
            .session(connection_id)
            .await
            .and_then(|session| session.current_room)
    }

    /// Queue `history` for the joiner only. Stops quietly if the connection
    /// goes away mid-replay.
    async fn replay(&self, connection_id: &ConnectionId, history: Vec<Message>) -> usize {
        let Some(outbound) = self.registry.outbound_of(connection_id).await else {
            return 0;
        };

        let total = history.len();
        let mut replayed = 0;
        for message in history {
            if outbound.send(OutboundEvent::Message(message)).is_err() {
                tracing::debug!(
                    "Connection '{}' closed during history replay ({}/{} sent)",
                    connection_id,
                    replayed,
                    total
                );
                break;
            }
            replayed += 1;
        }
        replayed
    }
}
