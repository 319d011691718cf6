//! UseCase: 切断処理
//!
//! ## テスト実装の作業記録
//!
//! ### 何をテストしているか
//! - DisconnectConnectionUseCase::execute() と broadcast_left()
//!
//! ### なぜこのテストが必要か
//! - 切断した接続は全てのルームから外れ、以降どの参加者リストにも現れてはならない
//! - 残った参加者には left が 1 回だけ届く必要がある
//!
//! ### どのような状況を想定しているか
//! - 正常系：1 つのルームから切断、複数のルームから切断
//! - エッジケース：どのルームにも参加していない接続の切断、二重の切断

use std::sync::Arc;

use crate::domain::{
    ConnectionId, ConnectionRegistry, Departure, MessagePushError, MessagePusher, RoomRepository,
};

/// 切断処理のユースケース
pub struct DisconnectConnectionUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<dyn ConnectionRegistry>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl DisconnectConnectionUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        registry: Arc<dyn ConnectionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            registry,
            message_pusher,
        }
    }

    /// 切断処理を実行
    ///
    /// # Returns
    ///
    /// 離脱したルームごとの通知内容（通知先は残った参加者）
    pub async fn execute(&self, connection_id: &ConnectionId) -> Vec<Departure> {
        // 1. 送信チャンネルを解除（以降この接続には何も送らない）
        self.message_pusher.unregister_client(connection_id).await;

        // 2. 表示名は削除前に取得しておく
        let display_name = self.registry.resolve(connection_id).await;

        // 3. 全てのルームから外す
        let rooms = self.repository.remove_connection(connection_id).await;

        // 4. Registry から削除
        self.registry.forget(connection_id).await;

        let mut departures = Vec::with_capacity(rooms.len());
        for room_id in rooms {
            let notify_targets = self
                .repository
                .members(&room_id)
                .await
                .into_iter()
                .map(|m| m.connection_id)
                .collect();
            departures.push(Departure {
                room_id,
                connection_id: connection_id.clone(),
                display_name: display_name.clone(),
                notify_targets,
            });
        }

        tracing::debug!(
            "Connection '{}' left {} room(s)",
            connection_id,
            departures.len()
        );

        departures
    }

    /// left を残った参加者に送信
    pub async fn broadcast_left(
        &self,
        departure: &Departure,
        message: &str,
    ) -> Result<(), MessagePushError> {
        self.message_pusher
            .broadcast(departure.notify_targets.clone(), message)
            .await
    }
}
