//! 外部プロセスの起動
//!
//! - `tokio_runner`: `tokio::process::Command` を使った ProcessRunner 実装
//! - `sandbox`: 起動するコマンドに隔離設定を適用するフック

pub mod sandbox;
pub mod tokio_runner;

pub use sandbox::{SandboxPolicy, ScrubbedEnvironment, Unconfined};
pub use tokio_runner::TokioProcessRunner;
