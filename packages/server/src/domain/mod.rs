//! Domain 層
//!
//! 値オブジェクト・エンティティ・実行モデルと、外側の層が実装する trait
//! （Repository, Registry, MessagePusher, ProcessRunner）を定義します。

pub mod entity;
pub mod error;
pub mod execution;
pub mod message_pusher;
pub mod process_runner;
pub mod repository;
pub mod value_object;

pub use entity::{Departure, MemberView, RoomMember};
pub use error::{ExecutionError, MessagePushError, ValueObjectError};
pub use execution::{
    CommandStep, DEFAULT_ENTRY_POINT, ExecutionJob, ExecutionOutcome, JobId, Language,
    NO_OUTPUT_MARKER, Toolchain, extract_entry_point,
};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use process_runner::{ProcessOutput, ProcessRunner};
pub use repository::{ConnectionRegistry, RoomRepository};
pub use value_object::{ConnectionId, ConnectionIdFactory, DisplayName, RoomId, Timestamp};
