//! 参加者の表示名解決

use crate::domain::{ConnectionRegistry, MemberView, RoomMember};

/// Registry を引いて参加者の表示名を解決する（順序は保持）
pub(crate) async fn resolve_members(
    registry: &dyn ConnectionRegistry,
    members: Vec<RoomMember>,
) -> Vec<MemberView> {
    let mut views = Vec::with_capacity(members.len());
    for member in members {
        let display_name = registry.resolve(&member.connection_id).await;
        views.push(MemberView {
            connection_id: member.connection_id,
            display_name,
            joined_at: member.joined_at,
        });
    }
    views
}
