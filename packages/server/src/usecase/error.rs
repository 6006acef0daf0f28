//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::{ErrorKind, RepositoryError, ValueObjectError};

/// Errors from registering a new connection
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),
}

/// Errors from joining a room
#[derive(Debug, Error)]
pub enum JoinRoomError {
    /// Missing or malformed username / room
    #[error("invalid join request: {0}")]
    InvalidInput(#[from] ValueObjectError),

    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),

    /// The join took effect but history could not be loaded
    #[error("history unavailable: {0}")]
    Persistence(#[from] RepositoryError),

    /// The server shut down before the join finished
    #[error("join interrupted by shutdown")]
    Interrupted,
}

impl JoinRoomError {
    /// Category reported back to the client
    pub fn kind(&self) -> ErrorKind {
        match self {
            JoinRoomError::InvalidInput(_) => ErrorKind::InvalidInput,
            JoinRoomError::UnknownConnection(_) => ErrorKind::NotJoined,
            JoinRoomError::Persistence(_) | JoinRoomError::Interrupted => {
                ErrorKind::PersistenceError
            }
        }
    }
}

/// Errors from posting a chat message
#[derive(Debug, Error)]
pub enum SendMessageError {
    /// The connection has not joined a room yet
    #[error("join a room before sending messages")]
    NotJoined,

    #[error("invalid message: {0}")]
    InvalidInput(#[from] ValueObjectError),

    /// The message was not stored, so it was not broadcast either
    #[error("message not stored: {0}")]
    Persistence(#[from] RepositoryError),

    /// The server shut down before the message was confirmed
    #[error("message interrupted by shutdown")]
    Interrupted,
}

impl SendMessageError {
    /// Category reported back to the client
    pub fn kind(&self) -> ErrorKind {
        match self {
            SendMessageError::NotJoined => ErrorKind::NotJoined,
            SendMessageError::InvalidInput(_) => ErrorKind::InvalidInput,
            SendMessageError::Persistence(_) | SendMessageError::Interrupted => {
                ErrorKind::PersistenceError
            }
        }
    }
}
