//! UseCase: ルーム詳細の取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, MemberView, RoomId, RoomRepository};

use super::{error::GetRoomDetailError, member::resolve_members};

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// # Returns
    ///
    /// * `Ok(Vec<MemberView>)` - 参加順の参加者
    /// * `Err(GetRoomDetailError::RoomNotFound)` - 参加者のいないルーム
    pub async fn execute(&self, room_id: &RoomId) -> Result<Vec<MemberView>, GetRoomDetailError> {
        let members = self.repository.members(room_id).await;
        if members.is_empty() {
            return Err(GetRoomDetailError::RoomNotFound);
        }
        Ok(resolve_members(self.registry.as_ref(), members).await)
    }
}
