//! UseCase: ルームへの参加
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - JoinRoomUseCase::execute() と broadcast_joined()
//!
//! ### なぜこのテストが必要か
//! - 参加者リストは「参加済みで未切断の接続」と一致しなければならない
//! - 参加した本人も含めた全員に joined が 1 通ずつ届く必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：空のルームへの参加、既存の参加者がいるルームへの参加
//! - エッジケース：同じ接続による再参加（表示名の上書き）

use std::sync::Arc;

use pairroom_shared::time::Clock;

use crate::domain::{
    ConnectionId, ConnectionRegistry, DisplayName, MemberView, MessagePushError, MessagePusher,
    RoomId, RoomRepository, Timestamp,
};

use super::member::resolve_members;

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    /// Repository（ルーム参加状況）
    repository: Arc<dyn RoomRepository>,
    /// Registry（接続 ID → 表示名）
    registry: Arc<dyn ConnectionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl JoinRoomUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            registry,
            message_pusher,
            clock,
        }
    }

    /// ルーム参加を実行
    ///
    /// # Returns
    ///
    /// 参加後のルームの参加者リスト（参加順、参加した本人を含む）
    pub async fn execute(
        &self,
        connection_id: &ConnectionId,
        room_id: &RoomId,
        display_name: DisplayName,
    ) -> Vec<MemberView> {
        // 1. Registry に表示名を記録
        self.registry.record_join(connection_id, display_name).await;

        // 2. ルームに参加者を追加（参加済みなら何もしない）
        let joined_at = Timestamp::new(self.clock.now_millis());
        self.repository
            .add_member(room_id, connection_id, joined_at)
            .await;

        // 3. 参加者リストを構築
        let members = self.repository.members(room_id).await;
        resolve_members(self.registry.as_ref(), members).await
    }

    /// joined を参加者全員（参加した本人を含む）に個別に送信
    pub async fn broadcast_joined(
        &self,
        members: &[MemberView],
        message: &str,
    ) -> Result<(), MessagePushError> {
        let targets = members.iter().map(|m| m.connection_id.clone()).collect();
        self.message_pusher.broadcast(targets, message).await
    }
}
