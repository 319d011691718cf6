//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! ルーム → 参加者 と 接続 → ルーム の 2 方向のインデックスを 1 つの Mutex で保持し、
//! 両者が食い違わないようにします。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, RoomId, RoomMember, RoomRepository, Timestamp};

#[derive(Default)]
struct RoomTable {
    /// ルーム ID → 参加者（参加順）
    rooms: HashMap<RoomId, Vec<RoomMember>>,
    /// 接続 ID → 参加中のルーム（参加順）
    memberships: HashMap<ConnectionId, Vec<RoomId>>,
}

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    table: Mutex<RoomTable>,
}

impl InMemoryRoomRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoomRepository for InMemoryRoomRepository {
    async fn add_member(&self, room_id: &RoomId, connection_id: &ConnectionId, at: Timestamp) {
        let mut table = self.table.lock().await;

        let members = table.rooms.entry(room_id.clone()).or_default();
        if members.iter().any(|m| &m.connection_id == connection_id) {
            return;
        }
        members.push(RoomMember::new(connection_id.clone(), at));

        table
            .memberships
            .entry(connection_id.clone())
            .or_default()
            .push(room_id.clone());
    }

    async fn members(&self, room_id: &RoomId) -> Vec<RoomMember> {
        let table = self.table.lock().await;
        table.rooms.get(room_id).cloned().unwrap_or_default()
    }

    async fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool {
        let table = self.table.lock().await;
        table
            .memberships
            .get(connection_id)
            .is_some_and(|rooms| rooms.contains(room_id))
    }

    async fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let table = self.table.lock().await;
        table
            .memberships
            .get(connection_id)
            .cloned()
            .unwrap_or_default()
    }

    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<RoomId> {
        let mut table = self.table.lock().await;

        let Some(rooms) = table.memberships.remove(connection_id) else {
            return Vec::new();
        };

        for room_id in &rooms {
            let now_empty = match table.rooms.get_mut(room_id) {
                Some(members) => {
                    members.retain(|m| &m.connection_id != connection_id);
                    members.is_empty()
                }
                None => false,
            };
            if now_empty {
                table.rooms.remove(room_id);
                tracing::debug!("Room '{}' is empty and has been dropped", room_id);
            }
        }

        rooms
    }

    async fn list_rooms(&self) -> Vec<(RoomId, Vec<RoomMember>)> {
        let table = self.table.lock().await;
        let mut rooms: Vec<(RoomId, Vec<RoomMember>)> = table
            .rooms
            .iter()
            .map(|(id, members)| (id.clone(), members.clone()))
            .collect();
        rooms.sort_by(|a, b| a.0.cmp(&b.0));
        rooms
    }
}
