//! Domain layer for the chat relay.
//!
//! This module contains business logic that is independent of
//! data transfer objects (DTOs) and infrastructure concerns.

pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod repository;
pub mod value_object;

pub use entity::{Message, Session};
pub use error::{RegistryError, RepositoryError, ValueObjectError};
pub use event::{ErrorKind, Outbound, OutboundEvent, OutboundReceiver};
pub use factory::ConnectionIdFactory;
pub use repository::{MessageRepository, RoomRegistry};
pub use value_object::{ConnectionId, MessageBody, RoomKey, Timestamp, Username};
