//! UseCase 層のエラー型

use thiserror::Error;

use crate::domain::{ConnectionId, MessagePushError, RoomId};

/// イベントを届けられなかった理由
///
/// いずれもプロトコル上のエラーであり、送信者には通知せず破棄する。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("connection '{connection_id}' is not a member of room '{room_id}'")]
    NotAMember {
        room_id: RoomId,
        connection_id: ConnectionId,
    },

    #[error("target connection '{0}' not found")]
    TargetNotFound(ConnectionId),

    #[error(transparent)]
    Push(#[from] MessagePushError),
}

impl DispatchError {
    /// 単一宛先への送信エラーを変換する（宛先不在を区別する）
    pub(crate) fn from_unicast(target: &ConnectionId, error: MessagePushError) -> Self {
        match error {
            MessagePushError::ClientNotFound(_) => Self::TargetNotFound(target.clone()),
            other => Self::Push(other),
        }
    }
}

/// ルーム詳細取得のエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GetRoomDetailError {
    #[error("room not found")]
    RoomNotFound,
}
