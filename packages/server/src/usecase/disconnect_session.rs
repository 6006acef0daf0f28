//! UseCase: 切断処理
//!
//! トランスポートが切断を報告したときに一度だけ実行される後始末。
//! 何度呼ばれても 1 回呼んだのと同じ結果になります。

use std::sync::Arc;

use crate::domain::{ConnectionId, RoomRegistry};

/// 切断処理のユースケース
pub struct DisconnectSessionUseCase {
    registry: Arc<dyn RoomRegistry>,
}

impl DisconnectSessionUseCase {
    pub fn new(registry: Arc<dyn RoomRegistry>) -> Self {
        Self { registry }
    }

    /// Tear down `connection_id`.
    ///
    /// Returns `true` only for the call that actually removed the session.
    pub async fn execute(&self, connection_id: &ConnectionId) -> bool {
        match self.registry.unregister(connection_id).await {
            Some(session) => {
                match session.current_room {
                    Some(room) => tracing::info!(
                        "Connection '{}' disconnected and left room '{}'",
                        connection_id,
                        room
                    ),
                    None => tracing::info!("Connection '{}' disconnected", connection_id),
                }
                true
            }
            None => {
                tracing::debug!("Connection '{}' was already torn down", connection_id);
                false
            }
        }
    }
}
