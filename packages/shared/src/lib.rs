//! Utilities shared by the Pairroom packages: logging setup and time.

pub mod logger;
pub mod time;
