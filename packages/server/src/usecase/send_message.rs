//! UseCase: メッセージ送信処理
//!
//! ## 処理の流れ
//! 1. 送信者のセッションからユーザー名と現在のルームを解決する（未参加なら NotJoined）
//! 2. 本文を検証する（不正なら InvalidInput）
//! 3. ルームのターンを取得し、サーバー側でタイムスタンプを付与して永続化する
//! 4. 永続化に成功したときだけ、その時点のルームメンバー全員（送信者を含む）に配信する
//!
//! 永続化に失敗した場合は配信しません（履歴と配信の一貫性を優先）。
//! 3 と 4 は別タスクで実行するため、呼び出し側が途中で破棄されても
//! 保存済みのメッセージは必ず配信されます。
//! 個々の配信失敗は記録するだけで、他の宛先への配信は続けます。

use std::sync::Arc;

use roomcast_shared::time::monotonic_millis;

use crate::domain::{
    ConnectionId, Message, MessageBody, MessageRepository, OutboundEvent, RoomKey, RoomRegistry,
    Timestamp, Username,
};

use super::{detach::run_detached, error::SendMessageError, sequencer::RoomSequencer};

/// Outcome of a broadcast
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// The message as persisted
    pub message: Message,
    /// Number of members the message was queued for
    pub delivered: usize,
    /// Number of members whose queue was already closed
    pub failed: usize,
}

/// メッセージ送信のユースケース
#[derive(Clone)]
pub struct SendMessageUseCase {
    registry: Arc<dyn RoomRegistry>,
    messages: Arc<dyn MessageRepository>,
    sequencer: Arc<RoomSequencer>,
}

impl SendMessageUseCase {
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

    /// メッセージ送信を実行
    ///
    /// # Errors
    ///
    /// * `NotJoined` - the sender has no current room
    /// * `InvalidInput` - empty or oversized body
    /// * `Persistence` - the message was not stored and not broadcast
    /// * `Interrupted` - the runtime shut down mid-send
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        body: String,
    ) -> Result<BroadcastReport, SendMessageError> {
        let session = self
            .registry
            .session(connection_id)
            .await
            .ok_or(SendMessageError::NotJoined)?;
        let (username, room) = session
            .membership()
            .map(|(username, room)| (username.clone(), room.clone()))
            .ok_or(SendMessageError::NotJoined)?;
        let body = MessageBody::new(body)?;

        let this = self.clone();
        let connection_id = connection_id.clone();
        run_detached(async move {
            this.persist_and_broadcast(&connection_id, username, room, body)
                .await
        })
        .await
        .unwrap_or(Err(SendMessageError::Interrupted))
    }

    async fn persist_and_broadcast(
        &self,
        connection_id: &ConnectionId,
        username: Username,
        room: RoomKey,
        body: MessageBody,
    ) -> Result<BroadcastReport, SendMessageError> {
        let _turn = self.sequencer.acquire(&room).await;

        let timestamp = Timestamp::new(monotonic_millis());
        let message = self
            .messages
            .create(username, room.clone(), body, timestamp)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    "Dropping message from '{}' in room '{}': {}",
                    connection_id,
                    room,
                    e
                );
            })?;

        let recipients = self.registry.recipients_of(&room).await;
        let mut report = BroadcastReport {
            message,
            delivered: 0,
            failed: 0,
        };
        for (target, outbound) in recipients {
            match outbound.send(OutboundEvent::Message(report.message.clone())) {
                Ok(()) => report.delivered += 1,
                Err(_) => {
                    tracing::warn!("Failed to deliver message to '{}'", target);
                    report.failed += 1;
                }
            }
        }

        tracing::debug!(
            "Broadcast from '{}' in room '{}' to {} member(s)",
            connection_id,
            room,
            report.delivered
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{
            ConnectionIdFactory, RepositoryError, ValueObjectError,
            repository::MockMessageRepository,
        },
        infrastructure::repository::InMemoryMessageRepository,
        usecase::fixtures::{Relay, room},
    };
    use async_trait::async_trait;
    use futures_util::FutureExt;
    use std::{collections::HashSet, time::Duration};

    /// Commits right away but yields once before reporting back, like a
    /// driver whose write is done while its future is still pending.
    #[derive(Default)]
    struct SlowAckStore {
        inner: InMemoryMessageRepository,
    }

    #[async_trait]
    impl MessageRepository for SlowAckStore {
        async fn create(
            &self,
            username: Username,
            room: RoomKey,
            body: MessageBody,
            timestamp: Timestamp,
        ) -> Result<Message, RepositoryError> {
            let message = self.inner.create(username, room, body, timestamp).await?;
            tokio::task::yield_now().await;
            Ok(message)
        }

        async fn find_by_room(&self, room: &RoomKey) -> Result<Vec<Message>, RepositoryError> {
            self.inner.find_by_room(room).await
        }
    }

    #[tokio::test]
    async fn test_send_before_join_is_not_joined() {
        // テスト項目: ルーム参加前の送信は NotJoined となり、保存も配信もされない
        // given (前提条件):
        let relay = Relay::in_memory();
        let mut conn = relay.connected().await;

        // when (操作):
        let result = relay
            .send_usecase()
            .execute(&conn.id, "hello?".to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(SendMessageError::NotJoined)));
        assert!(conn.drain().is_empty());
    }

    #[tokio::test]
    async fn test_send_from_unknown_connection_is_not_joined() {
        // テスト項目: 未登録の接続からの送信も NotJoined になる
        // given (前提条件):
        let relay = Relay::in_memory();

        // when (操作):
        let result = relay
            .send_usecase()
            .execute(&ConnectionIdFactory::generate(), "hi".to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(SendMessageError::NotJoined)));
    }

    #[tokio::test]
    async fn test_send_empty_body_is_invalid_input() {
        // テスト項目: 空のメッセージは InvalidInput となる
        // given (前提条件):
        let relay = Relay::in_memory();
        let mut alice = relay.joined("alice", "lobby").await;

        // when (操作):
        let result = relay.send_usecase().execute(&alice.id, String::new()).await;

        // then (期待する結果):
        assert!(matches!(
            result,
            Err(SendMessageError::InvalidInput(ValueObjectError::MessageBodyEmpty))
        ));
        assert!(alice.drain().is_empty());
    }

    #[tokio::test]
    async fn test_send_broadcasts_to_room_including_sender() {
        // テスト項目: 送信者を含むルームの全員に 1 回ずつ届き、別ルームには届かない（シナリオ C）
        // given (前提条件):
        let relay = Relay::in_memory();
        let mut alice = relay.joined("alice", "lobby").await;
        let mut bob = relay.joined("bob", "lobby").await;
        let mut carol = relay.joined("carol", "other").await;

        // when (操作):
        let report = relay
            .send_usecase()
            .execute(&alice.id, "hello".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(report.message.username.as_str(), "alice");
        assert_eq!(report.message.room, room("lobby"));
        assert_eq!(alice.drain_bodies(), vec!["hello"]);
        assert_eq!(bob.drain_bodies(), vec!["hello"]);
        assert!(carol.drain().is_empty());
    }

    #[tokio::test]
    async fn test_sent_message_appears_in_history() {
        // テスト項目: 送信したメッセージが後から参加した人の履歴に含まれる（シナリオ B）
        // given (前提条件):
        let relay = Relay::in_memory();
        let alice = relay.joined("alice", "lobby").await;
        relay
            .send_usecase()
            .execute(&alice.id, "hi".to_string())
            .await
            .unwrap();

        // when (操作):
        let mut bob = relay.connected().await;
        relay
            .join_usecase()
            .execute(&bob.id, "bob".to_string(), "lobby".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        let events = bob.drain();
        assert_eq!(events.len(), 1);
        let OutboundEvent::Message(message) = &events[0] else {
            panic!("expected a message event, got {:?}", events[0]);
        };
        assert_eq!(message.username.as_str(), "alice");
        assert_eq!(message.room, room("lobby"));
        assert_eq!(message.body.as_str(), "hi");
    }

    #[tokio::test]
    async fn test_closed_member_is_skipped() {
        // テスト項目: 切断済みの宛先は飛ばされ、送信者には届く（シナリオ D）
        // given (前提条件):
        let relay = Relay::in_memory();
        let alice = relay.joined("alice", "lobby").await;
        let mut bob = relay.joined("bob", "lobby").await;
        let alice_id = alice.id.clone();
        drop(alice);

        // when (操作):
        let report = relay
            .send_usecase()
            .execute(&bob.id, "anyone?".to_string())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(report.delivered, 1);
        assert_eq!(bob.drain_bodies(), vec!["anyone?"]);
        assert!(!relay.registry.members_of(&room("lobby")).await.contains(&alice_id));
    }

    #[tokio::test]
    async fn test_persistence_failure_suppresses_broadcast() {
        // テスト項目: 永続化に失敗したら誰にも配信されない
        // given (前提条件):
        let mut store = MockMessageRepository::new();
        store.expect_find_by_room().returning(|_| Ok(Vec::new()));
        store
            .expect_create()
            .times(1)
            .returning(|_, _, _, _| Err(RepositoryError::Unavailable("disk full".to_string())));
        let relay = Relay::with_messages(Arc::new(store));
        let mut alice = relay.joined("alice", "lobby").await;
        let mut bob = relay.joined("bob", "lobby").await;

        // when (操作):
        let result = relay
            .send_usecase()
            .execute(&alice.id, "lost".to_string())
            .await;

        // then (期待する結果):
        assert!(matches!(result, Err(SendMessageError::Persistence(_))));
        assert!(alice.drain().is_empty());
        assert!(bob.drain().is_empty());
    }

    #[tokio::test]
    async fn test_timestamps_increase_within_room() {
        // テスト項目: 同じルームのメッセージは保存順にタイムスタンプが増加する
        // given (前提条件):
        let relay = Relay::in_memory();
        let alice = relay.joined("alice", "lobby").await;

        // when (操作):
        for i in 0..20 {
            relay
                .send_usecase()
                .execute(&alice.id, format!("m{i}"))
                .await
                .unwrap();
        }

        // then (期待する結果):
        let history = relay.messages.find_by_room(&room("lobby")).await.unwrap();
        assert_eq!(history.len(), 20);
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_join_never_duplicates_messages() {
        // テスト項目: 送信と参加が競合しても、参加者には全メッセージがちょうど 1 回ずつ保存順に届く
        // given (前提条件):
        let relay = Relay::in_memory();
        let alice = relay.joined("alice", "lobby").await;
        let mut bob = relay.connected().await;

        // when (操作):
        let mut sends = Vec::new();
        for i in 0..50 {
            let usecase = relay.send_usecase();
            let alice_id = alice.id.clone();
            sends.push(tokio::spawn(async move {
                usecase.execute(&alice_id, format!("m{i}")).await.unwrap();
            }));
        }
        let join = relay.join_usecase();
        let bob_id = bob.id.clone();
        let joining = tokio::spawn(async move {
            join.execute(&bob_id, "bob".to_string(), "lobby".to_string())
                .await
                .unwrap();
        });
        for send in sends {
            send.await.unwrap();
        }
        joining.await.unwrap();

        // then (期待する結果):
        let received = bob.drain_bodies();
        let unique: HashSet<&String> = received.iter().collect();
        assert_eq!(unique.len(), received.len());

        let persisted: Vec<String> = relay
            .messages
            .find_by_room(&room("lobby"))
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.body.into_string())
            .collect();
        assert_eq!(received, persisted);
    }

    #[tokio::test]
    async fn test_abandoned_send_is_still_broadcast() {
        // テスト項目: 送信側の処理が途中で破棄されても、保存されたメッセージは全員に配信される
        // given (前提条件):
        let relay = Relay::with_messages(Arc::new(SlowAckStore::default()));
        let alice = relay.joined("alice", "lobby").await;
        let mut bob = relay.joined("bob", "lobby").await;
        let usecase = relay.send_usecase();

        // when (操作): 1 回だけ poll して破棄する（リーダータスクの abort と同じ）
        let polled = usecase
            .execute(&alice.id, "ghost".to_string())
            .now_or_never();
        assert!(polled.is_none());

        // then (期待する結果):
        let live = tokio::time::timeout(Duration::from_secs(1), bob.rx.recv())
            .await
            .expect("broadcast never arrived")
            .unwrap();
        let OutboundEvent::Message(live) = live else {
            panic!("expected a message event, got {live:?}");
        };
        assert_eq!(live.body.as_str(), "ghost");

        let history = relay.messages.find_by_room(&room("lobby")).await.unwrap();
        assert_eq!(history, vec![live]);
    }
}
