//! UseCase: 接続受付処理
//!
//! ゲートウェイが受け付けた接続を、ルーム未参加のセッションとして登録します。

use std::sync::Arc;

use roomcast_shared::time::now_millis;

use crate::domain::{ConnectionId, Outbound, RegistryError, RoomRegistry, Timestamp};

use super::error::ConnectError;

/// 接続受付のユースケース
pub struct ConnectSessionUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl ConnectSessionUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Register `connection_id` with its outbound queue.
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        outbound: Outbound,
    ) -> Result<(), ConnectError> {
        self.registry
            .register(connection_id, outbound, Timestamp::new(now_millis()))
            .await
            .map_err(|e| match e {
                RegistryError::DuplicateConnection(id) | RegistryError::UnknownConnection(id) => {
                    ConnectError::DuplicateConnection(id)
                }
            })
    }
}
