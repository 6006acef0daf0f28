//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    domain::RoomKey,
    infrastructure::dto::{http::RoomSummaryDto, websocket::MessagePayload},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Live rooms with their member counts
pub async fn list_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state
        .registry
        .rooms()
        .await
        .into_iter()
        .map(|(room, members)| RoomSummaryDto {
            room: room.into_string(),
            members,
        })
        .collect();

    Json(rooms)
}

/// Persisted history of a room, oldest first
pub async fn room_history(
    State(state): State<Arc<AppState>>,
    Path(room): Path<String>,
) -> Result<Json<Vec<MessagePayload>>, StatusCode> {
    let room = RoomKey::new(room).map_err(|_| StatusCode::BAD_REQUEST)?;

    let history = state.messages.find_by_room(&room).await.map_err(|e| {
        tracing::error!("Failed to load history of room '{}': {}", room, e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(history.iter().map(MessagePayload::from).collect()))
}
