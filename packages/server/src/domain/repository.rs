//! Repository / Registry trait 定義
//!
//! ドメイン層が必要とする状態ストアのインターフェースを定義します。
//! 具体的な実装は Infrastructure 層が提供します（依存性の逆転）。
//!
//! どちらの trait もエラーを返しません。「存在しない」は正常な状態
//! （参加前・切断後）として空の結果で表現します。

use async_trait::async_trait;

use super::{ConnectionId, DisplayName, RoomId, RoomMember, Timestamp};

/// 接続 ID → 表示名 の Registry
///
/// エントリは「一度以上 join し、まだ切断していない」接続にのみ存在する。
#[async_trait]
pub trait ConnectionRegistry: Send + Sync {
    /// 表示名を記録する（既存の名前は上書き）
    async fn record_join(&self, connection_id: &ConnectionId, display_name: DisplayName);

    /// 表示名を解決する
    async fn resolve(&self, connection_id: &ConnectionId) -> Option<DisplayName>;

    /// エントリを削除する（存在しなければ何もしない）
    async fn forget(&self, connection_id: &ConnectionId);
}

/// ルームの参加状況を保持する Repository
///
/// ルームは参加者が 1 人以上いる間だけ存在する。
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// 参加者を追加する（参加済みなら何もしない）
    async fn add_member(&self, room_id: &RoomId, connection_id: &ConnectionId, at: Timestamp);

    /// ルームの参加者を参加順に取得する
    async fn members(&self, room_id: &RoomId) -> Vec<RoomMember>;

    /// 接続がルームに参加しているか
    async fn is_member(&self, room_id: &RoomId, connection_id: &ConnectionId) -> bool;

    /// 接続が参加しているルームを参加順に取得する
    async fn rooms_of(&self, connection_id: &ConnectionId) -> Vec<RoomId>;

    /// 接続を全てのルームから外し、外れたルームを返す
    ///
    /// 参加者がいなくなったルームは削除される。
    async fn remove_connection(&self, connection_id: &ConnectionId) -> Vec<RoomId>;

    /// 全ルームを ID 順に取得する
    async fn list_rooms(&self) -> Vec<(RoomId, Vec<RoomMember>)>;
}
