//! インメモリ実装（プロセス再起動で全て失われる）

mod registry;
mod room;

pub use registry::InMemoryConnectionRegistry;
pub use room::InMemoryRoomRepository;
