//! Data transfer objects at the transport boundary.

pub mod http;
pub mod websocket;
