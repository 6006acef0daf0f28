//! Room-based chat relay.
//!
//! Clients join named rooms over WebSocket, receive the room's history on
//! join, and exchange messages that are persisted and then broadcast to
//! every member of the room.

pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use config::ServerConfig;
pub use error::ServerError;
pub use ui::{run, serve, state::AppState};
