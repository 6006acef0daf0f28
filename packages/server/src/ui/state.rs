//! Shared application state.

use std::sync::Arc;

use crate::{
    config::ServerConfig,
    domain::{MessageRepository, RoomRegistry},
    error::ServerError,
    infrastructure::{
        registry::InMemoryRoomRegistry,
        repository::{InMemoryMessageRepository, SqliteMessageRepository},
    },
    usecase::{
        ConnectSessionUseCase, DisconnectSessionUseCase, JoinRoomUseCase, RoomSequencer,
        SendMessageUseCase,
    },
};

/// Long-lived collaborators shared by every connection handler.
///
/// Built once at start-up and handed to axum as router state.
pub struct AppState {
    /// Live connections and room membership
    pub registry: Arc<dyn RoomRegistry>,
    /// Message history（データアクセス層の抽象化）
    pub messages: Arc<dyn MessageRepository>,
    /// Per-room ordering of joins and broadcasts
    pub sequencer: Arc<RoomSequencer>,
}

impl AppState {
    pub fn new(registry: Arc<dyn RoomRegistry>, messages: Arc<dyn MessageRepository>) -> Self {
        Self {
            registry,
            messages,
            sequencer: Arc::new(RoomSequencer::new()),
        }
    }

    /// State with an in-memory message store.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryRoomRegistry::new()),
            Arc::new(InMemoryMessageRepository::new()),
        )
    }

    /// Build the state described by `config`.
    ///
    /// Without a database URL history lives in memory; `sqlite:` URLs select
    /// the SQLite store. Anything else is rejected.
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let messages: Arc<dyn MessageRepository> = match config.database_url.as_deref() {
            None => {
                tracing::warn!("No database URL configured; history is kept in memory only");
                Arc::new(InMemoryMessageRepository::new())
            }
            Some(url) if url.starts_with("sqlite:") => {
                Arc::new(SqliteMessageRepository::connect(url).await?)
            }
            Some(url) => return Err(ServerError::UnsupportedDatabaseUrl(url.to_string())),
        };

        Ok(Self::new(Arc::new(InMemoryRoomRegistry::new()), messages))
    }

    pub fn connect_session(&self) -> ConnectSessionUseCase {
        ConnectSessionUseCase::new(self.registry.clone())
    }

    pub fn join_room(&self) -> JoinRoomUseCase {
        JoinRoomUseCase::new(
            self.registry.clone(),
            self.messages.clone(),
            self.sequencer.clone(),
        )
    }

    pub fn send_message(&self) -> SendMessageUseCase {
        SendMessageUseCase::new(
            self.registry.clone(),
            self.messages.clone(),
            self.sequencer.clone(),
        )
    }

    pub fn disconnect_session(&self) -> DisconnectSessionUseCase {
        DisconnectSessionUseCase::new(self.registry.clone())
    }
}
