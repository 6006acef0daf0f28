//! UseCase 層
//!
//! ブロードキャストエンジンのビジネスロジックを実装するレイヤー。
//! UI 層（ゲートウェイ）から呼び出され、Domain 層の Registry と Repository を操作します。

pub mod connect_session;
mod detach;
pub mod disconnect_session;
pub mod error;
pub mod join_room;
pub mod send_message;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use connect_session::ConnectSessionUseCase;
pub use disconnect_session::DisconnectSessionUseCase;
pub use error::{ConnectError, JoinRoomError, SendMessageError};
pub use join_room::{JoinOutcome, JoinRoomUseCase};
pub use send_message::{BroadcastReport, SendMessageUseCase};
pub use sequencer::{RoomSequencer, RoomTurn};
