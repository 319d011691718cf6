//! UseCase: 音声通話のシグナリング中継
//!
//! offer / answer / ICE candidate のペイロードを解釈せずに宛先へ転送します。
//! 送信者 ID の付与はメッセージ組み立て側（UI 層）で行います。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher};

use super::error::DispatchError;

pub struct RelaySignalUseCase {
    message_pusher: Arc<dyn MessagePusher>,
}

impl RelaySignalUseCase {
    pub fn new(message_pusher: Arc<dyn MessagePusher>) -> Self {
        Self { message_pusher }
    }

    pub async fn execute(&self, target: &ConnectionId, message: &str) -> Result<(), DispatchError> {
        let result = self
            .message_pusher
            .push_to(target, message)
            .await
            .map_err(|e| DispatchError::from_unicast(target, e));
        if result.is_ok() {
            tracing::trace!("Relayed signaling message to '{}'", target);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::usecase::testing::{Fixture, connection, drain};

    #[tokio::test]
    async fn test_relay_forwards_verbatim() {
        // テスト項目: 中継メッセージがそのまま宛先に届く
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = RelaySignalUseCase::new(fixture.pusher.clone());
        let mut rx_b = fixture.attach(&connection("b")).await;
        let message = r#"{"type":"voice-offer","payload":{"sdp":"v=0"},"fromConnectionId":"a"}"#;

        // when (操作):
        usecase.execute(&connection("b"), message).await.unwrap();

        // then (期待する結果):
        assert_eq!(drain(&mut rx_b), vec![message]);
    }

    #[tokio::test]
    async fn test_relay_to_departed_target_is_dropped() {
        // テスト項目: 切断済みの相手への中継は TargetNotFound になる
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = RelaySignalUseCase::new(fixture.pusher.clone());
        let _rx = fixture.attach(&connection("b")).await;
        fixture.pusher.unregister_client(&connection("b")).await;

        // when (操作):
        let result = usecase.execute(&connection("b"), "{}").await;

        // then (期待する結果):
        assert_eq!(result, Err(DispatchError::TargetNotFound(connection("b"))));
    }
}
