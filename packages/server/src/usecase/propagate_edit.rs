//! UseCase: 編集内容の伝搬
//!
//! 送信者以外のルーム参加者に編集内容をそのまま転送します（送信者には返さない）。
//! 内容のマージは行わず、サーバーへの到着順がそのまま配送順になります。

use std::sync::Arc;

use crate::domain::{ConnectionId, MessagePusher, RoomId, RoomRepository};

use super::error::DispatchError;

pub struct PropagateEditUseCase {
    repository: Arc<dyn RoomRepository>,
    message_pusher: Arc<dyn MessagePusher>,
}

impl PropagateEditUseCase {
    pub fn new(
        repository: Arc<dyn RoomRepository>,
        message_pusher: Arc<dyn MessagePusher>,
    ) -> Self {
        Self {
            repository,
            message_pusher,
        }
    }

    /// 編集内容を伝搬する
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<ConnectionId>)` - 配送先（送信者以外の参加者）
    /// * `Err(DispatchError::NotAMember)` - 送信者がルームに参加していない
    pub async fn execute(
        &self,
        sender: &ConnectionId,
        room_id: &RoomId,
        message: &str,
    ) -> Result<Vec<ConnectionId>, DispatchError> {
        if !self.repository.is_member(room_id, sender).await {
            return Err(DispatchError::NotAMember {
                room_id: room_id.clone(),
                connection_id: sender.clone(),
            });
        }

        let targets: Vec<ConnectionId> = self
            .repository
            .members(room_id)
            .await
            .into_iter()
            .map(|m| m.connection_id)
            .filter(|id| id != sender)
            .collect();

        self.message_pusher
            .broadcast(targets.clone(), message)
            .await?;

        Ok(targets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::Timestamp,
        usecase::testing::{Fixture, connection, drain, room},
    };

    #[tokio::test]
    async fn test_edit_reaches_others_but_not_sender() {
        // テスト項目: 編集は送信者以外の参加者に 1 通ずつ届き、送信者には返らない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = PropagateEditUseCase::new(fixture.repository.clone(), fixture.pusher.clone());
        let (a, b, c) = (connection("a"), connection("b"), connection("c"));
        let mut rx_a = fixture.attach(&a).await;
        let mut rx_b = fixture.attach(&b).await;
        let mut rx_c = fixture.attach(&c).await;
        for id in [&a, &b, &c] {
            fixture
                .repository
                .add_member(&room("r1"), id, Timestamp::new(0))
                .await;
        }

        // when (操作):
        let targets = usecase.execute(&b, &room("r1"), "x=1").await.unwrap();

        // then (期待する結果):
        assert_eq!(targets, vec![a.clone(), c.clone()]);
        assert_eq!(drain(&mut rx_a), vec!["x=1"]);
        assert!(drain(&mut rx_b).is_empty());
        assert_eq!(drain(&mut rx_c), vec!["x=1"]);
    }

    #[tokio::test]
    async fn test_edit_does_not_leak_to_other_rooms() {
        // テスト項目: 別のルームの参加者には届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = PropagateEditUseCase::new(fixture.repository.clone(), fixture.pusher.clone());
        let (a, b) = (connection("a"), connection("b"));
        let _rx_a = fixture.attach(&a).await;
        let mut rx_b = fixture.attach(&b).await;
        fixture
            .repository
            .add_member(&room("r1"), &a, Timestamp::new(0))
            .await;
        fixture
            .repository
            .add_member(&room("r2"), &b, Timestamp::new(0))
            .await;

        // when (操作):
        let targets = usecase.execute(&a, &room("r1"), "x=1").await.unwrap();

        // then (期待する結果):
        assert!(targets.is_empty());
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_edit_to_unjoined_room_is_rejected() {
        // テスト項目: 参加していないルームへの編集は NotAMember になり、誰にも届かない
        // given (前提条件):
        let fixture = Fixture::new();
        let usecase = PropagateEditUseCase::new(fixture.repository.clone(), fixture.pusher.clone());
        let (a, b) = (connection("a"), connection("b"));
        let mut rx_b = fixture.attach(&b).await;
        fixture
            .repository
            .add_member(&room("r1"), &b, Timestamp::new(0))
            .await;

        // when (操作):
        let result = usecase.execute(&a, &room("r1"), "x=1").await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(DispatchError::NotAMember {
                room_id: room("r1"),
                connection_id: a,
            })
        );
        assert!(drain(&mut rx_b).is_empty());
    }
}
