//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

/// Room with its members (`GET /api/rooms`, `GET /api/rooms/{room_id}`)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub members: Vec<MemberDetailDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberDetailDto {
    pub connection_id: String,
    pub display_name: Option<String>,
    /// RFC 3339 (UTC)
    pub joined_at: String,
}
