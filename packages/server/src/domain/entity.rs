//! エンティティ

use super::value_object::{ConnectionId, DisplayName, RoomId, Timestamp};

/// ルームの参加者（参加順に保持される）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomMember {
    pub connection_id: ConnectionId,
    pub joined_at: Timestamp,
}

impl RoomMember {
    pub fn new(connection_id: ConnectionId, joined_at: Timestamp) -> Self {
        Self {
            connection_id,
            joined_at,
        }
    }
}

/// Registry で表示名を解決済みの参加者
///
/// 表示名は参加時に必ず登録されるが、Registry と Room は別々に保持されるため
/// `Option` で表現する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberView {
    pub connection_id: ConnectionId,
    pub display_name: Option<DisplayName>,
    pub joined_at: Timestamp,
}

/// 切断した接続が抜けたルームと、その通知先
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub room_id: RoomId,
    pub connection_id: ConnectionId,
    /// 切断時点で最後に知られていた表示名
    pub display_name: Option<DisplayName>,
    /// 切断した接続自身を除くルームの参加者
    pub notify_targets: Vec<ConnectionId>,
}
