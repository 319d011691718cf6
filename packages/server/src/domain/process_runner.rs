//! ProcessRunner trait 定義
//!
//! 外部のコンパイラ・インタプリタを起動して出力を取り込むインターフェース。

use async_trait::async_trait;
use tokio::time::Instant;

use super::{CommandStep, ExecutionError};

/// 1 ステップ分のプロセス実行結果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    /// 終了コード（シグナルで終了した場合やタイムアウト時は `None`）
    pub exit_code: Option<i32>,
    pub timed_out: bool,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// `step` を実行し、`deadline` を過ぎたらプロセスを kill してタイムアウトとして返す
    ///
    /// 起動に失敗した場合のみ `Err` を返す。非ゼロ終了は `Ok` で返す。
    async fn run(
        &self,
        step: &CommandStep,
        deadline: Instant,
    ) -> Result<ProcessOutput, ExecutionError>;
}
