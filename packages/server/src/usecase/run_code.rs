//! UseCase: コードの実行
//!
//! クライアントから受け取ったソースを一時ファイルに書き出し、言語に応じた
//! ツールチェインで実行して出力を 1 つの文字列として返します。
//!
//! ## 処理の流れ
//!
//! 1. 言語タグの解決とジョブの作成（ジョブ固有のディレクトリを割り当て）
//! 2. ソースの書き出し
//! 3. コマンドの実行（全ステップ共通の期限付き）
//! 4. 結果の分類
//! 5. 後片付け（結果を返す前に必ず実行）
//!
//! このユースケースは Dispatcher とは別のタスクで実行されます。
//! Registry やルームの状態には一切触れません。

use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use tokio::{sync::Semaphore, time::Instant};
use tracing::{debug, info, warn};

use crate::domain::{
    ConnectionId, ExecutionError, ExecutionJob, ExecutionOutcome, Language, MessagePusher,
    ProcessOutput, ProcessRunner, Toolchain,
};

use super::error::DispatchError;

/// コード実行の設定
#[derive(Debug, Clone)]
pub struct RunCodeConfig {
    /// ジョブディレクトリを作成する親ディレクトリ
    pub work_dir: PathBuf,
    /// 1 ジョブ（コンパイルと実行の合計）の制限時間
    pub timeout: Duration,
    /// 同時に実行できるジョブ数の上限
    pub max_concurrent_jobs: usize,
    pub toolchain: Toolchain,
}

impl Default for RunCodeConfig {
    fn default() -> Self {
        Self {
            work_dir: std::env::temp_dir().join("pairroom-jobs"),
            timeout: Duration::from_secs(10),
            max_concurrent_jobs: 8,
            toolchain: Toolchain::default(),
        }
    }
}

/// コード実行のユースケース
pub struct RunCodeUseCase {
    /// ProcessRunner（外部プロセス起動の抽象化）
    runner: Arc<dyn ProcessRunner>,
    /// MessagePusher（結果の通知）
    message_pusher: Arc<dyn MessagePusher>,
    config: RunCodeConfig,
    /// 同時実行数の制限（上限を超えた要求は空きを待つ）
    permits: Arc<Semaphore>,
}

impl RunCodeUseCase {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        message_pusher: Arc<dyn MessagePusher>,
        config: RunCodeConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            runner,
            message_pusher,
            config,
            permits,
        }
    }

    /// コード実行を行い、クライアントへ返す出力を返す
    ///
    /// 成功・失敗・タイムアウトのいずれでも必ず 1 つの文字列を返す。
    pub async fn execute(&self, origin: ConnectionId, source: String, language_tag: &str) -> String {
        let job = self.prepare(origin, Language::from_tag(language_tag), source);
        self.run(&job).await
    }

    /// ジョブを作成する（ファイルはまだ書き出さない）
    pub fn prepare(&self, origin: ConnectionId, language: Language, source: String) -> ExecutionJob {
        ExecutionJob::new(origin, language, source, &self.config.work_dir)
    }

    /// ジョブを実行し、後片付けを済ませてから出力を返す
    pub async fn run(&self, job: &ExecutionJob) -> String {
        // Semaphore は close しないため、取得に失敗することはない
        let _permit = self.permits.acquire().await.ok();

        let start = Instant::now();
        info!(
            job_id = %job.id,
            language = %job.language,
            origin = %job.origin,
            "execution started"
        );

        let outcome = self.run_job(job).await;
        self.cleanup(job).await;

        info!(
            job_id = %job.id,
            language = %job.language,
            origin = %job.origin,
            outcome = outcome_label(&outcome),
            duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "execution finished"
        );

        outcome.into_output()
    }

    /// 実行結果（code-output）を実行を要求した接続にだけ送る
    pub async fn deliver_output(
        &self,
        origin: &ConnectionId,
        message: &str,
    ) -> Result<(), DispatchError> {
        self.message_pusher
            .push_to(origin, message)
            .await
            .map_err(|e| DispatchError::from_unicast(origin, e))
    }

    async fn run_job(&self, job: &ExecutionJob) -> ExecutionOutcome {
        if let Err(e) = self.materialize(job).await {
            return failure(e);
        }

        let deadline = Instant::now() + self.config.timeout;
        let mut last = ProcessOutput::default();

        for step in job.plan(&self.config.toolchain) {
            let output = match self.runner.run(&step, deadline).await {
                Ok(output) => output,
                Err(e) => return failure(e),
            };

            if output.timed_out {
                return ExecutionOutcome::TimedOut {
                    limit: self.config.timeout,
                };
            }

            // コンパイルに失敗したら実行ステップには進まない
            if !output.success() {
                let description = match output.exit_code {
                    Some(code) => format!("{} exited with code {}", step.program_name(), code),
                    None => format!("{} was terminated by a signal", step.program_name()),
                };
                return ExecutionOutcome::Failed {
                    stderr: output.stderr,
                    description,
                };
            }

            last = output;
        }

        ExecutionOutcome::Completed {
            stdout: last.stdout,
        }
    }

    /// ジョブディレクトリを作成し、ソースを書き出す
    async fn materialize(&self, job: &ExecutionJob) -> Result<(), ExecutionError> {
        tokio::fs::create_dir_all(&job.workspace)
            .await
            .map_err(|source| ExecutionError::Io {
                path: job.workspace.clone(),
                source,
            })?;
        tokio::fs::write(&job.source_path, job.source.as_bytes())
            .await
            .map_err(|source| ExecutionError::Io {
                path: job.source_path.clone(),
                source,
            })?;
        debug!(job_id = %job.id, path = %job.source_path.display(), "source written");
        Ok(())
    }

    /// ソース・ビルド成果物・ジョブディレクトリを削除する
    ///
    /// 存在しないファイルは無視し、それ以外の失敗はログに残すだけで結果には影響させない。
    async fn cleanup(&self, job: &ExecutionJob) {
        for artifact in job.artifacts() {
            report_cleanup(job, artifact, tokio::fs::remove_file(artifact).await);
        }
        // 内部クラスの class ファイルなど、名前を把握していない成果物もまとめて削除
        report_cleanup(
            job,
            &job.workspace,
            tokio::fs::remove_dir_all(&job.workspace).await,
        );
    }
}

fn failure(error: ExecutionError) -> ExecutionOutcome {
    ExecutionOutcome::Failed {
        stderr: String::new(),
        description: error.to_string(),
    }
}

fn report_cleanup(job: &ExecutionJob, path: &Path, result: io::Result<()>) {
    match result {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            job_id = %job.id,
            path = %path.display(),
            "failed to clean up execution artifact: {}",
            e
        ),
    }
}

fn outcome_label(outcome: &ExecutionOutcome) -> &'static str {
    match outcome {
        ExecutionOutcome::Completed { .. } => "completed",
        ExecutionOutcome::Failed { .. } => "failed",
        ExecutionOutcome::TimedOut { .. } => "timed_out",
    }
}
