//! UI layer: the WebSocket gateway and HTTP API.

pub mod handler;
mod runner;
mod signal;
pub mod state;

pub use runner::{router, run, serve};
pub use signal::shutdown_signal;
