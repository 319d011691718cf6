//! UseCase: 新しい参加者へのコード同期
//!
//! 既存の参加者が現在のコードを指定した相手 1 人だけに送ります。
//! 相手が同じルームにいるかどうかは確認しません（宛先の存在のみ確認）。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};

use super::error::DispatchError;

pub struct SyncCodeUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl SyncCodeUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub async fn execute(&self, target: &ConnectionId, message: &str) -> Result<(), DispatchError> {
        self.message_pusher
            .push_to(target, message)
            .await
            .map_err(|e| DispatchError::from_unicast(target, e))
    }
}
