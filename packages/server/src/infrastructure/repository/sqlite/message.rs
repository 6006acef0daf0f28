//! SQLite Message Repository 実装
//!
//! `sqlite:` URL で指定されたデータベースにメッセージを永続化します。
//! テーブルは接続時に作成されます。

use std::{str::FromStr, time::Duration};

use async_trait::async_trait;
use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};

use crate::domain::{
    Message, MessageBody, MessageRepository, RepositoryError, RoomKey, Timestamp, Username,
};

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    username TEXT NOT NULL,
    room TEXT NOT NULL,
    message TEXT NOT NULL,
    time INTEGER NOT NULL
)";

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_messages_room_time ON messages (room, time, id)";

fn unavailable(context: &str, err: sqlx::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("{context}: {err}"))
}

/// SQLite Message Repository 実装
#[derive(Clone)]
pub struct SqliteMessageRepository {
    pool: SqlitePool,
}

impl SqliteMessageRepository {
    /// Open (creating if missing) the database at `database_url` and make
    /// sure the schema exists.
    ///
    /// In-memory URLs get a single long-lived connection, since every
    /// SQLite connection would otherwise see its own empty database.
    pub async fn connect(database_url: &str) -> Result<Self, RepositoryError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| unavailable("parse sqlite url", e))?
            .create_if_missing(true);

        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| unavailable("connect sqlite", e))?;

        let repository = Self { pool };
        repository.migrate().await?;
        tracing::info!("Message store ready at '{}'", database_url);
        Ok(repository)
    }

    async fn migrate(&self) -> Result<(), RepositoryError> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("create messages table", e))?;
        sqlx::query(CREATE_INDEX)
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("create messages index", e))?;
        Ok(())
    }
}

#[async_trait]
impl MessageRepository for SqliteMessageRepository {
    async fn create(
        &self,
        username: Username,
        room: RoomKey,
        body: MessageBody,
        timestamp: Timestamp,
    ) -> Result<Message, RepositoryError> {
        sqlx::query("INSERT INTO messages (username, room, message, time) VALUES (?, ?, ?, ?)")
            .bind(username.as_str())
            .bind(room.as_str())
            .bind(body.as_str())
            .bind(timestamp.value())
            .execute(&self.pool)
            .await
            .map_err(|e| unavailable("insert message", e))?;

        Ok(Message::new(username, room, body, timestamp))
    }

    async fn find_by_room(&self, room: &RoomKey) -> Result<Vec<Message>, RepositoryError> {
        let rows: Vec<(String, String, String, i64)> = sqlx::query_as(
            "SELECT username, room, message, time FROM messages WHERE room = ? ORDER BY time ASC, id ASC",
        )
        .bind(room.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| unavailable("select messages", e))?;

        rows.into_iter()
            .map(|(username, room, message, time)| -> Result<Message, RepositoryError> {
                Ok(Message::new(
                    Username::new(username)?,
                    RoomKey::new(room)?,
                    MessageBody::new(message)?,
                    Timestamp::new(time),
                ))
            })
            .collect()
    }
}
