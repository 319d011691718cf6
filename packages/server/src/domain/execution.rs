//! コード実行のドメインモデル
//!
//! - 言語タグ → ファイル拡張子・起動コマンド・コンパイル要否 の解決
//! - ジョブごとの一時ファイル配置（ジョブ固有のディレクトリ）
//! - 実行結果の分類（クライアントへ返す出力文字列の決定）

use std::{
    ffi::OsString,
    fmt,
    path::{Path, PathBuf},
    sync::LazyLock,
    time::Duration,
};

use regex::Regex;
use uuid::Uuid;

use super::ConnectionId;

/// Java のエントリポイントが見つからなかった場合のクラス名
pub const DEFAULT_ENTRY_POINT: &str = "Main";

/// 正常終了かつ標準出力が空だった場合に返す出力
pub const NO_OUTPUT_MARKER: &str = "Code executed successfully with no output.";

const SOURCE_STEM: &str = "main";
const BINARY_FILE_NAME: &str = "main.out";

/// `public` なトップレベル型宣言（ネストした `static` クラスには一致しない）
static ENTRY_POINT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\bpublic\s+(?:(?:final|abstract|sealed|strictfp)\s+)*(?:class|record|enum|interface)\s+([A-Za-z_$][A-Za-z0-9_$]*)",
    )
    .expect("entry point pattern must compile")
});

/// 実行可能な言語
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Java,
    Cpp,
    JavaScript,
}

impl Language {
    /// クライアントが送る言語タグを解決する
    ///
    /// 未知のタグは JavaScript として扱う。
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "python" => Self::Python,
            "java" => Self::Java,
            "cpp" => Self::Cpp,
            _ => Self::JavaScript,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::JavaScript => "javascript",
        }
    }

    pub fn source_suffix(self) -> &'static str {
        match self {
            Self::Python => "py",
            Self::Java => "java",
            Self::Cpp => "cpp",
            Self::JavaScript => "js",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// 起動するツールチェインのバイナリ名
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub python: String,
    pub node: String,
    pub cxx: String,
    pub javac: String,
    pub java: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            node: "node".to_string(),
            cxx: "g++".to_string(),
            javac: "javac".to_string(),
            java: "java".to_string(),
        }
    }
}

/// ジョブごとに生成される一意なトークン
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 起動するコマンド 1 つ分
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandStep {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub working_dir: PathBuf,
}

impl CommandStep {
    fn new(program: impl Into<OsString>, working_dir: &Path) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.to_path_buf(),
        }
    }

    fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// ログ・エラーメッセージ用のプログラム名
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// 1 回の実行リクエスト
///
/// 「書き込み → 起動 → 出力取得 → 後片付け」の間だけ存在する。全ての一時ファイルは
/// `workspace`（`<work_root>/job-<id>`）の下に置かれるため、並行するジョブ同士で
/// パスが衝突することはない。
#[derive(Debug, Clone)]
pub struct ExecutionJob {
    pub id: JobId,
    pub origin: ConnectionId,
    pub language: Language,
    pub source: String,
    pub workspace: PathBuf,
    pub source_path: PathBuf,
    /// C++ の実行ファイル、または Java の class ファイル
    pub build_path: Option<PathBuf>,
    /// Java のみ: ソースから抽出したクラス名
    pub entry_point: Option<String>,
}

impl ExecutionJob {
    pub fn new(origin: ConnectionId, language: Language, source: String, work_root: &Path) -> Self {
        let id = JobId::generate();
        let workspace = work_root.join(format!("job-{id}"));

        let entry_point = (language == Language::Java).then(|| extract_entry_point(&source));
        let stem = entry_point.as_deref().unwrap_or(SOURCE_STEM);
        let source_path = workspace.join(format!("{stem}.{}", language.source_suffix()));
        let build_path = match language {
            Language::Cpp => Some(workspace.join(BINARY_FILE_NAME)),
            Language::Java => Some(workspace.join(format!("{stem}.class"))),
            Language::Python | Language::JavaScript => None,
        };

        Self {
            id,
            origin,
            language,
            source,
            workspace,
            source_path,
            build_path,
            entry_point,
        }
    }

    /// 実行するコマンド列。前のステップが失敗したら以降は実行しない。
    pub fn plan(&self, toolchain: &Toolchain) -> Vec<CommandStep> {
        let dir = self.workspace.as_path();
        let source = self.source_path.as_os_str();

        match (self.language, self.build_path.as_deref()) {
            (Language::Python, _) => vec![CommandStep::new(&toolchain.python, dir).arg(source)],
            (Language::Cpp, Some(binary)) => vec![
                CommandStep::new(&toolchain.cxx, dir)
                    .arg(source)
                    .arg("-o")
                    .arg(binary),
                CommandStep::new(binary, dir),
            ],
            (Language::Java, _) => {
                let entry_point = self.entry_point.as_deref().unwrap_or(DEFAULT_ENTRY_POINT);
                vec![
                    CommandStep::new(&toolchain.javac, dir)
                        .arg("-d")
                        .arg(dir)
                        .arg(source),
                    CommandStep::new(&toolchain.java, dir)
                        .arg("-cp")
                        .arg(dir)
                        .arg(entry_point),
                ]
            }
            (Language::JavaScript, _) | (Language::Cpp, None) => {
                vec![CommandStep::new(&toolchain.node, dir).arg(source)]
            }
        }
    }

    /// 後片付けで削除するファイル（ソース、ビルド成果物の順）
    pub fn artifacts(&self) -> Vec<&Path> {
        std::iter::once(self.source_path.as_path())
            .chain(self.build_path.as_deref())
            .collect()
    }
}

/// Java ソースから `public` なトップレベル型の名前を抽出する
///
/// パーサではなくテキスト走査による推定。コメントや文字列中の宣言に一致する
/// 可能性がある。見つからなければ [`DEFAULT_ENTRY_POINT`] を返す。
pub fn extract_entry_point(source: &str) -> String {
    ENTRY_POINT_PATTERN
        .captures(source)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_ENTRY_POINT.to_string())
}

/// ジョブの実行結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// 全てのステップが正常終了した
    Completed { stdout: String },
    /// 起動失敗・非ゼロ終了・ファイル準備の失敗
    Failed { stderr: String, description: String },
    /// 制限時間を超えたため kill した
    TimedOut { limit: Duration },
}

impl ExecutionOutcome {
    /// クライアントへ返す出力文字列に変換する
    pub fn into_output(self) -> String {
        match self {
            Self::Completed { stdout } if stdout.is_empty() => NO_OUTPUT_MARKER.to_string(),
            Self::Completed { stdout } => stdout,
            Self::Failed {
                stderr,
                description,
            } => {
                if stderr.is_empty() {
                    description
                } else {
                    stderr
                }
            }
            Self::TimedOut { limit } => format!("Execution timed out after {limit:?}."),
        }
    }
}
