//! Collaborative code-editing server.
//!
//! Connections join named rooms over WebSocket. Edits are fanned out to the
//! other members of the room, source code can be executed on the server with
//! the output returned to the requester, and voice-call signaling messages are
//! relayed between peers.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;
