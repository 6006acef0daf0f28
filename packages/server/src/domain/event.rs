//! Events the relay pushes to a connection's outbound queue.

use std::fmt;

use tokio::sync::mpsc;

use super::entity::Message;

/// Per-connection outbound queue handed to the registry by the gateway.
pub type Outbound = mpsc::UnboundedSender<OutboundEvent>;

/// Receiving half of [`Outbound`], drained by the gateway's writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundEvent>;

/// Rejection categories reported back to the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    NotJoined,
    PersistenceError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::InvalidInput => "invalidInput",
            ErrorKind::NotJoined => "notJoined",
            ErrorKind::PersistenceError => "persistenceError",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundEvent {
    /// A chat message, either replayed history or a live broadcast
    Message(Message),
    /// A rejected request from this connection
    Error { kind: ErrorKind, reason: String },
}

impl OutboundEvent {
    pub fn error(kind: ErrorKind, reason: impl Into<String>) -> Self {
        Self::Error {
            kind,
            reason: reason.into(),
        }
    }
}
