//! Test fixtures shared by the use case tests.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    domain::{
        ConnectionId, ConnectionIdFactory, MessageRepository, OutboundEvent, OutboundReceiver,
        RoomKey, RoomRegistry,
    },
    infrastructure::{registry::InMemoryRoomRegistry, repository::InMemoryMessageRepository},
};

use super::{ConnectSessionUseCase, JoinRoomUseCase, RoomSequencer, SendMessageUseCase};

pub(crate) fn room(key: &str) -> RoomKey {
    RoomKey::new(key.to_string()).unwrap()
}

/// Collaborators wired the same way the server wires them.
pub(crate) struct Relay {
    pub registry: Arc<dyn RoomRegistry>,
    pub messages: Arc<dyn MessageRepository>,
    pub sequencer: Arc<RoomSequencer>,
}

/// A connected test client and the receiving end of its outbound queue.
pub(crate) struct Client {
    pub id: ConnectionId,
    pub rx: OutboundReceiver,
}

impl Client {
    /// Everything queued for this client so far.
    pub fn drain(&mut self) -> Vec<OutboundEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Bodies of the queued message events; panics on anything else.
    pub fn drain_bodies(&mut self) -> Vec<String> {
        self.drain()
            .into_iter()
            .map(|event| match event {
                OutboundEvent::Message(message) => message.body.into_string(),
                other => panic!("expected a message event, got {other:?}"),
            })
            .collect()
    }
}

impl Relay {
    pub fn in_memory() -> Self {
        Self::with_messages(Arc::new(InMemoryMessageRepository::new()))
    }

    pub fn with_messages(messages: Arc<dyn MessageRepository>) -> Self {
        Self {
            registry: Arc::new(InMemoryRoomRegistry::new()),
            messages,
            sequencer: Arc::new(RoomSequencer::new()),
        }
    }

    pub fn join_usecase(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.registry.clone(),
            self.messages.clone(),
            self.sequencer.clone(),
        )
    }

    pub fn send_usecase(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.registry.clone(),
            self.messages.clone(),
            self.sequencer.clone(),
        )
    }

    pub async fn connected(&self) -> Client {
        let id = ConnectionIdFactory::generate();
        let (tx, rx) = mpsc::unbounded_channel();
        ConnectSessionUseCase::new(self.registry.clone())
            .execute(id.clone(), tx)
            .await
            .unwrap();
        Client { id, rx }
    }

    /// Connect and join `room` as `username`, discarding the history replay.
    pub async fn joined(&self, username: &str, room: &str) -> Client {
        let mut client = self.connected().await;
        self.join_usecase()
            .execute(&client.id, username.to_string(), room.to_string())
            .await
            .unwrap();
        client.drain();
        client
    }
}
