//! HTTP API response DTOs for the chat relay.

use serde::{Deserialize, Serialize};

/// Live room summary for the room list endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub room: String,
    pub members: usize,
}
