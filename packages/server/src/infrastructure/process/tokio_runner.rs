//! ProcessRunner 実装（`tokio::process::Command`）
//!
//! 子プロセスは専用のプロセスグループで起動し、終了後・タイムアウト時にはグループごと
//! kill する。実行したコードがバックグラウンドに残したプロセスも後片付けの対象になる。

use std::{process::Stdio, sync::Arc};

use async_trait::async_trait;
use tokio::{
    io::{AsyncRead, AsyncReadExt},
    sync::Mutex,
    task::JoinHandle,
    time::Instant,
};
use tracing::{debug, warn};

use crate::domain::{CommandStep, ExecutionError, ProcessOutput, ProcessRunner};

use super::sandbox::{SandboxPolicy, Unconfined};

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// 出力を取り込みつつ、期限付きでサブプロセスを実行する ProcessRunner
pub struct TokioProcessRunner {
    policy: Arc<dyn SandboxPolicy>,
}

impl TokioProcessRunner {
    pub fn new(policy: Arc<dyn SandboxPolicy>) -> Self {
        Self { policy }
    }
}

impl Default for TokioProcessRunner {
    fn default() -> Self {
        Self::new(Arc::new(Unconfined))
    }
}

/// パイプから読み取ったバイト列
///
/// 読み取りタスクが途中で abort されても、それまでに読めた分はここに残る。
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    async fn into_string(self) -> String {
        let bytes = self.0.lock().await;
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// パイプを EOF まで読み続けるタスクを起動する
fn drain<R>(pipe: Option<R>) -> (Captured, JoinHandle<()>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let captured = Captured::default();
    let sink = captured.clone();
    let handle = tokio::spawn(async move {
        let Some(mut pipe) = pipe else {
            return;
        };
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => sink.0.lock().await.extend_from_slice(&chunk[..n]),
            }
        }
    });
    (captured, handle)
}

/// 読み取りタスクの終了を deadline まで待ち、そこまでに読めた分を返す
///
/// プロセスグループから抜けた子孫がパイプを握り続けていても、deadline で打ち切る。
async fn collect((captured, handle): (Captured, JoinHandle<()>), deadline: Instant) -> String {
    let abort = handle.abort_handle();
    if tokio::time::timeout_at(deadline, handle).await.is_err() {
        abort.abort();
    }
    captured.into_string().await
}

fn elapsed_millis(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// プロセスグループ全体に SIGKILL を送る（既に誰も残っていなければ何もしない）
#[cfg(unix)]
fn kill_process_group(program: &str, pgid: Option<u32>) {
    let Some(pgid) = pgid.and_then(|id| libc::pid_t::try_from(id).ok()) else {
        return;
    };
    // SAFETY: killpg はシグナルを送るだけで、メモリには触れない
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(program = %program, "failed to kill process group {}: {}", pgid, err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_program: &str, _pgid: Option<u32>) {}

#[async_trait]
impl ProcessRunner for TokioProcessRunner {
    async fn run(
        &self,
        step: &CommandStep,
        deadline: Instant,
    ) -> Result<ProcessOutput, ExecutionError> {
        let start = Instant::now();
        let program = step.program_name();

        let mut cmd = tokio::process::Command::new(&step.program);
        cmd.args(&step.args)
            .current_dir(&step.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);
        self.policy.confine(&mut cmd);

        debug!(program = %program, policy = self.policy.name(), "spawning process");

        let mut child = cmd.spawn().map_err(|source| ExecutionError::Spawn {
            program: program.clone(),
            source,
        })?;
        // process_group(0) なので子プロセスの pid がそのままグループ ID になる
        let pgid = child.id();

        // kill できるよう、パイプは先に取り出しておく
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        tokio::select! {
            status = child.wait() => {
                // 子が終了した時点で、残った子孫もまとめて片付ける
                kill_process_group(&program, pgid);
                let status = status.map_err(|source| ExecutionError::Wait {
                    program: program.clone(),
                    source,
                })?;
                let stdout = collect(stdout, deadline).await;
                let stderr = collect(stderr, deadline).await;

                debug!(
                    program = %program,
                    exit_code = ?status.code(),
                    duration_ms = elapsed_millis(start),
                    "process completed"
                );

                Ok(ProcessOutput {
                    stdout,
                    stderr,
                    exit_code: status.code(),
                    timed_out: false,
                })
            }
            () = tokio::time::sleep_until(deadline) => {
                kill_process_group(&program, pgid);
                if let Err(e) = child.kill().await {
                    warn!(program = %program, "failed to kill timed out process: {}", e);
                }
                let stdout = collect(stdout, Instant::now()).await;
                collect(stderr, Instant::now()).await;
                warn!(
                    program = %program,
                    duration_ms = elapsed_millis(start),
                    "process timed out"
                );
                Ok(ProcessOutput {
                    stdout,
                    stderr: "Process timed out".into(),
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{ffi::OsString, path::PathBuf, time::Duration};

    use tokio::io::AsyncWriteExt;

    use super::*;
    use crate::infrastructure::process::ScrubbedEnvironment;

    fn shell(script: &str) -> CommandStep {
        CommandStep {
            program: OsString::from("sh"),
            args: vec![OsString::from("-c"), OsString::from(script)],
            working_dir: std::env::temp_dir(),
        }
    }

    fn env_step() -> CommandStep {
        CommandStep {
            program: OsString::from("/usr/bin/env"),
            args: vec![],
            working_dir: std::env::temp_dir(),
        }
    }

    fn deadline_in(millis: u64) -> Instant {
        Instant::now() + Duration::from_millis(millis)
    }

    #[tokio::test]
    async fn test_run_captures_stdout_and_stderr_separately() {
        // テスト項目: 標準出力と標準エラー出力が別々に取り込まれる
        // given (前提条件):
        let runner = TokioProcessRunner::default();

        // when (操作):
        let result = runner
            .run(&shell("echo out && echo err >&2"), deadline_in(10_000))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(result.success());
        assert_eq!(result.stdout, "out\n");
        assert_eq!(result.stderr, "err\n");
    }

    #[tokio::test]
    async fn test_run_reports_non_zero_exit() {
        // テスト項目: 非ゼロ終了は Err ではなく終了コード付きの結果として返る
        // given (前提条件):
        let runner = TokioProcessRunner::default();

        // when (操作):
        let result = runner
            .run(&shell("echo broken >&2; exit 3"), deadline_in(10_000))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(!result.success());
        assert_eq!(result.exit_code, Some(3));
        assert_eq!(result.stderr.trim(), "broken");
    }

    #[tokio::test]
    async fn test_run_uses_step_working_dir() {
        // テスト項目: ステップの作業ディレクトリで起動される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let step = CommandStep {
            working_dir: dir.path().to_path_buf(),
            ..shell("pwd")
        };
        let runner = TokioProcessRunner::default();

        // when (操作):
        let result = runner.run(&step, deadline_in(10_000)).await.unwrap();

        // then (期待する結果):
        let reported = PathBuf::from(result.stdout.trim()).canonicalize().unwrap();
        assert_eq!(reported, dir.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_run_spawn_failure_is_error() {
        // テスト項目: 存在しないプログラムは Spawn エラーになり、名前がメッセージに含まれる
        // given (前提条件):
        let step = CommandStep {
            program: OsString::from("pairroom-no-such-binary"),
            args: vec![],
            working_dir: std::env::temp_dir(),
        };
        let runner = TokioProcessRunner::default();

        // when (操作):
        let err = runner.run(&step, deadline_in(10_000)).await.unwrap_err();

        // then (期待する結果):
        assert!(matches!(err, ExecutionError::Spawn { .. }));
        assert!(err.to_string().contains("pairroom-no-such-binary"));
    }

    #[tokio::test]
    async fn test_run_kills_process_at_deadline() {
        // テスト項目: deadline を過ぎたプロセスは kill され、タイムアウトとして返る
        // given (前提条件):
        let runner = TokioProcessRunner::default();
        let start = std::time::Instant::now();

        // when (操作):
        let result = runner.run(&shell("sleep 60"), deadline_in(100)).await.unwrap();

        // then (期待する結果):
        assert!(result.timed_out);
        assert!(!result.success());
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_run_with_expired_deadline_times_out() {
        // テスト項目: 既に過ぎた deadline を渡すと即座にタイムアウトになる
        // given (前提条件):
        let runner = TokioProcessRunner::default();
        let deadline = Instant::now() - Duration::from_millis(1);

        // when (操作):
        let result = runner.run(&shell("sleep 5"), deadline).await.unwrap();

        // then (期待する結果):
        assert!(result.timed_out);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_returns_output_when_background_process_remains() {
        // テスト項目: バックグラウンドプロセスを残して終了しても、出力がすぐに返る
        // given (前提条件):
        let runner = TokioProcessRunner::default();
        let start = std::time::Instant::now();

        // when (操作):
        let result = runner
            .run(&shell("echo hi; sleep 30 &"), deadline_in(5_000))
            .await
            .unwrap();

        // then (期待する結果):
        assert!(result.success());
        assert_eq!(result.stdout, "hi\n");
        assert!(start.elapsed() < Duration::from_secs(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_kills_background_process_on_timeout() {
        // テスト項目: タイムアウト時はバックグラウンドで起動された子孫プロセスも kill される
        // given (前提条件):
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");
        let script = format!("(sleep 1; touch '{}') & wait", marker.display());
        let runner = TokioProcessRunner::default();

        // when (操作):
        let result = runner.run(&shell(&script), deadline_in(200)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1_500)).await;

        // then (期待する結果):
        assert!(result.timed_out);
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn test_collect_keeps_partial_output_at_deadline() {
        // テスト項目: パイプが閉じないまま deadline を迎えても、読めた分の出力は失われない
        // given (前提条件):
        let (mut writer, reader) = tokio::io::duplex(64);
        writer.write_all(b"partial").await.unwrap();
        let drained = drain(Some(reader));

        // when (操作):
        let output = collect(drained, deadline_in(100)).await;

        // then (期待する結果):
        assert_eq!(output, "partial");
        drop(writer);
    }

    #[tokio::test]
    async fn test_scrubbed_environment_drops_unlisted_variables() {
        // テスト項目: 許可リストが空なら子プロセスの環境変数は空になる
        // given (前提条件):
        let runner = TokioProcessRunner::new(Arc::new(ScrubbedEnvironment::keeping(
            Vec::<String>::new(),
        )));

        // when (操作):
        let result = runner.run(&env_step(), deadline_in(10_000)).await.unwrap();

        // then (期待する結果):
        assert!(result.success());
        assert!(result.stdout.trim().is_empty());
    }

    #[tokio::test]
    async fn test_scrubbed_environment_keeps_path() {
        // テスト項目: 既定の許可リストでは PATH が引き継がれる
        // given (前提条件):
        let Some(path) = std::env::var_os("PATH") else {
            return;
        };
        let runner = TokioProcessRunner::new(Arc::new(ScrubbedEnvironment::default()));

        // when (操作):
        let result = runner.run(&env_step(), deadline_in(10_000)).await.unwrap();

        // then (期待する結果):
        let expected = format!("PATH={}", path.to_string_lossy());
        assert!(result.stdout.lines().any(|line| line == expected));
    }
}
