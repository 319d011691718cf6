//! WebSocket / HTTP surface and the event dispatcher.

mod dispatcher;
mod handler;
mod server;
mod signal;
pub mod state;

pub use dispatcher::{DispatchEvent, Dispatcher, DispatcherHandle, UseCases};
pub use server::Server;
