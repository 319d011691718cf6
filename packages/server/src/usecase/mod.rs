//! UseCase 層
//!
//! 操作ごとに 1 つのユースケースを定義します。各ユースケースは Domain 層の trait
//! にのみ依存し、Dispatcher から 1 イベントずつ順番に呼び出されます。

mod attach_connection;
mod disconnect_connection;
mod error;
mod get_room_detail;
mod get_rooms;
mod join_room;
mod member;
mod propagate_edit;
mod relay_signal;
mod run_code;
mod sync_code;

#[cfg(test)]
pub(crate) mod testing;

pub use attach_connection::AttachConnectionUseCase;
pub use disconnect_connection::DisconnectConnectionUseCase;
pub use error::{DispatchError, GetRoomDetailError};
pub use get_room_detail::GetRoomDetailUseCase;
pub use get_rooms::GetRoomsUseCase;
pub use join_room::JoinRoomUseCase;
pub use propagate_edit::PropagateEditUseCase;
pub use relay_signal::RelaySignalUseCase;
pub use run_code::{RunCodeConfig, RunCodeUseCase};
pub use sync_code::SyncCodeUseCase;
