//! UseCase: ルーム一覧の取得

use std::sync::Arc;

use crate::domain::{ConnectionRegistry, MemberView, RoomId, RoomRepository};

use super::member::resolve_members;

pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<dyn ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 参加者が 1 人以上いるルームを ID 順に返す
    pub async fn execute(&self) -> Vec<(RoomId, Vec<MemberView>)> {
        let rooms = self.repository.list_rooms().await;
        let mut result = Vec::with_capacity(rooms.len());
        for (room_id, members) in rooms {
            let views = resolve_members(self.registry.as_ref(), members).await;
            result.push((room_id, views));
        }
        result
    }
}
