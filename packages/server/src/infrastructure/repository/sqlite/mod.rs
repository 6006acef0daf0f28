//! SQLite-backed repository implementations.

mod message;

pub use message::SqliteMessageRepository;
