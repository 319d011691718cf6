//! InMemory Connection Registry 実装

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionRegistry, DisplayName};

/// 接続 ID → 表示名 のインメモリ Registry
///
/// キーごとの更新は独立しているため、マップ全体を 1 つの Mutex で保護するだけで十分。
#[derive(Default)]
pub struct InMemoryConnectionRegistry {
    names: Mutex<HashMap<ConnectionId, DisplayName>>,
}

impl InMemoryConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConnectionRegistry for InMemoryConnectionRegistry {
    async fn record_join(&self, connection_id: &ConnectionId, display_name: DisplayName) {
        let mut names = self.names.lock().await;
        names.insert(connection_id.clone(), display_name);
    }

    async fn resolve(&self, connection_id: &ConnectionId) -> Option<DisplayName> {
        let names = self.names.lock().await;
        names.get(connection_id).cloned()
    }

    async fn forget(&self, connection_id: &ConnectionId) {
        let mut names = self.names.lock().await;
        names.remove(connection_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    fn connection(id: &str) -> ConnectionId {
        ConnectionId::new(id.to_string()).unwrap()
    }

    #[tokio::test]
    async fn test_resolve_before_join_is_absent() {
        // テスト項目: join 前の接続は表示名を持たない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();

        // when (操作):
        let result = registry.resolve(&connection("a")).await;

        // then (期待する結果):
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_record_join_overwrites_previous_name() {
        // テスト項目: 再度 join すると表示名が上書きされる
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let a = connection("a");
        registry.record_join(&a, DisplayName::from("alice")).await;

        // when (操作):
        registry.record_join(&a, DisplayName::from("alicia")).await;

        // then (期待する結果):
        assert_eq!(registry.resolve(&a).await, Some(DisplayName::from("alicia")));
    }

    #[tokio::test]
    async fn test_forget_is_idempotent() {
        // テスト項目: forget は存在しないエントリに対しても何も起きない
        // given (前提条件):
        let registry = InMemoryConnectionRegistry::new();
        let a = connection("a");
        registry.record_join(&a, DisplayName::from("alice")).await;

        // when (操作):
        registry.forget(&a).await;
        registry.forget(&a).await;

        // then (期待する結果):
        assert_eq!(registry.resolve(&a).await, None);
    }

    #[tokio::test]
    async fn test_concurrent_joins_do_not_interfere() {
        // テスト項目: 並行した join / forget でもエントリが壊れない
        // given (前提条件):
        let registry = Arc::new(InMemoryConnectionRegistry::new());

        // when (操作): 50 接続が同時に join し、偶数番目だけ forget する
        let handles: Vec<_> = (0..50)
            .map(|i| {
                let registry = registry.clone();
                tokio::spawn(async move {
                    let id = connection(&format!("conn-{i}"));
                    registry
                        .record_join(&id, DisplayName::new(format!("user-{i}")))
                        .await;
                    if i % 2 == 0 {
                        registry.forget(&id).await;
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        // then (期待する結果):
        for i in 0..50 {
            let resolved = registry.resolve(&connection(&format!("conn-{i}"))).await;
            if i % 2 == 0 {
                assert_eq!(resolved, None);
            } else {
                assert_eq!(resolved, Some(DisplayName::new(format!("user-{i}"))));
            }
        }
    }
}
