//! Conversion from domain entities to DTOs.

use pairroom_shared::time::timestamp_to_rfc3339;

use crate::domain::{MemberView, RoomId};
use crate::infrastructure::dto::{
    http::{MemberDetailDto, RoomSummaryDto},
    websocket::MemberDto,
};

impl From<MemberView> for MemberDto {
    fn from(model: MemberView) -> Self {
        Self {
            connection_id: model.connection_id.into_string(),
            display_name: model.display_name.map(|name| name.into_string()),
        }
    }
}

impl From<MemberView> for MemberDetailDto {
    fn from(model: MemberView) -> Self {
        Self {
            connection_id: model.connection_id.into_string(),
            display_name: model.display_name.map(|name| name.into_string()),
            joined_at: timestamp_to_rfc3339(model.joined_at.value()),
        }
    }
}

impl From<(RoomId, Vec<MemberView>)> for RoomSummaryDto {
    fn from((id, members): (RoomId, Vec<MemberView>)) -> Self {
        Self {
            id: id.into_string(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}
