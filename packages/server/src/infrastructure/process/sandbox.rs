//! 起動する全てのツールチェインコマンドに適用されるサンドボックスフック
//!
//! 隔離の方式は固定しない。名前空間・コンテナ・専用ユーザーなどは [`SandboxPolicy`] を
//! 実装して [`TokioProcessRunner::new`](super::TokioProcessRunner::new) に渡せば差し込める。

use tokio::process::Command;

pub trait SandboxPolicy: Send + Sync {
    /// 起動前の `command` を調整する
    fn confine(&self, command: &mut Command);

    /// ログ用の短い名前
    fn name(&self) -> &'static str;
}

/// サーバー自身の環境変数・権限のまま実行する
#[derive(Debug, Clone, Copy, Default)]
pub struct Unconfined;

impl SandboxPolicy for Unconfined {
    fn confine(&self, _command: &mut Command) {}

    fn name(&self) -> &'static str {
        "unconfined"
    }
}

/// 子プロセスの環境変数を空にし、許可リストにある変数だけを引き継ぐ
#[derive(Debug, Clone)]
pub struct ScrubbedEnvironment {
    keep: Vec<String>,
}

impl ScrubbedEnvironment {
    pub fn keeping<I, S>(keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for ScrubbedEnvironment {
    fn default() -> Self {
        Self::keeping(["PATH", "HOME", "LANG"])
    }
}

impl SandboxPolicy for ScrubbedEnvironment {
    fn confine(&self, command: &mut Command) {
        command.env_clear();
        for key in &self.keep {
            if let Some(value) = std::env::var_os(key) {
                command.env(key, value);
            }
        }
    }

    fn name(&self) -> &'static str {
        "scrubbed-env"
    }
}
