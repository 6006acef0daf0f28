//! Domain layer error definitions.

use thiserror::Error;

/// Errors related to Value Objects validation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueObjectError {
    /// ConnectionId validation error
    #[error("ConnectionId cannot be empty")]
    ConnectionIdEmpty,

    /// Username validation error
    #[error("username cannot be empty")]
    UsernameEmpty,

    /// Username too long error
    #[error("username cannot exceed {max} characters (got {actual})")]
    UsernameTooLong { max: usize, actual: usize },

    /// RoomKey validation error
    #[error("room cannot be empty")]
    RoomKeyEmpty,

    /// RoomKey too long error
    #[error("room cannot exceed {max} characters (got {actual})")]
    RoomKeyTooLong { max: usize, actual: usize },

    /// MessageBody validation error
    #[error("message cannot be empty")]
    MessageBodyEmpty,

    /// MessageBody too long error
    #[error("message cannot exceed {max} characters (got {actual})")]
    MessageBodyTooLong { max: usize, actual: usize },
}

/// Errors raised by the room registry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(String),

    #[error("connection '{0}' is not registered")]
    UnknownConnection(String),
}

/// Errors raised by the message store
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The backing store could not be reached or rejected the statement
    #[error("message store unavailable: {0}")]
    Unavailable(String),

    /// A stored row could not be turned back into a domain message
    #[error("corrupt message record: {0}")]
    Corrupt(#[from] ValueObjectError),
}
