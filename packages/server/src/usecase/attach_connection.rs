//! UseCase: 接続の受付
//!
//! WebSocket 接続が確立した時点で送信チャンネルを登録し、割り当てた接続 ID を
//! クライアントに知らせます。ルームへの参加は別のイベント（join）で行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, PusherChannel};

use super::error::DispatchError;

pub struct AttachConnectionUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl AttachConnectionUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    /// 送信チャンネルを登録し、`greeting` を最初のメッセージとして送る
    pub async fn execute(
        &self,
        connection_id: ConnectionId,
        sender: PusherChannel,
        greeting: &str,
    ) -> Result<(), DispatchError> {
        self.message_pusher
            .register_client(connection_id.clone(), sender)
            .await;
        self.message_pusher
            .push_to(&connection_id, greeting)
            .await
            .map_err(|e| DispatchError::from_unicast(&connection_id, e))
    }
}
