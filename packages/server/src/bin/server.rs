//! Collaborative code-editing server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin pairroom-server
//! cargo run --bin pairroom-server -- --host 0.0.0.0 --port 5000 --scrub-env
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use pairroom_server::{
    domain::Toolchain,
    infrastructure::{
        message_pusher::WebSocketMessagePusher,
        process::{SandboxPolicy, ScrubbedEnvironment, TokioProcessRunner, Unconfined},
        repository::{InMemoryConnectionRegistry, InMemoryRoomRepository},
    },
    ui::{Server, UseCases},
    usecase::{
        AttachConnectionUseCase, DisconnectConnectionUseCase, GetRoomDetailUseCase,
        GetRoomsUseCase, JoinRoomUseCase, PropagateEditUseCase, RelaySignalUseCase,
        RunCodeConfig, RunCodeUseCase, SyncCodeUseCase,
    },
};
use pairroom_shared::{logger::setup_logger, time::SystemClock};

#[derive(Parser, Debug)]
#[command(name = "pairroom-server")]
#[command(about = "Collaborative code-editing server with code execution and voice signaling", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value = "5000")]
    port: u16,

    /// Wall-clock limit for one execution job (compile and run), in seconds
    #[arg(long, env = "PAIRROOM_EXEC_TIMEOUT_SECS", default_value = "10")]
    exec_timeout_secs: u64,

    /// Maximum number of execution jobs running at the same time
    #[arg(long, env = "PAIRROOM_MAX_CONCURRENT_JOBS", default_value = "8")]
    max_concurrent_jobs: usize,

    /// Directory under which per-job workspaces are created
    /// [default: <system temp>/pairroom-jobs]
    #[arg(long, env = "PAIRROOM_WORK_DIR")]
    work_dir: Option<PathBuf>,

    /// Python interpreter
    #[arg(long, default_value = "python3")]
    python_bin: String,

    /// Node.js interpreter
    #[arg(long, default_value = "node")]
    node_bin: String,

    /// C++ compiler
    #[arg(long, default_value = "g++")]
    cxx_bin: String,

    /// Java compiler
    #[arg(long, default_value = "javac")]
    javac_bin: String,

    /// Java launcher
    #[arg(long, default_value = "java")]
    java_bin: String,

    /// Clear the environment of executed programs except PATH, HOME and LANG
    #[arg(long)]
    scrub_env: bool,
}

impl Args {
    fn run_code_config(&self) -> RunCodeConfig {
        let defaults = RunCodeConfig::default();
        RunCodeConfig {
            work_dir: self.work_dir.clone().unwrap_or(defaults.work_dir),
            timeout: Duration::from_secs(self.exec_timeout_secs),
            max_concurrent_jobs: self.max_concurrent_jobs,
            toolchain: Toolchain {
                python: self.python_bin.clone(),
                node: self.node_bin.clone(),
                cxx: self.cxx_bin.clone(),
                javac: self.javac_bin.clone(),
                java: self.java_bin.clone(),
            },
        }
    }

    fn sandbox_policy(&self) -> Arc<dyn SandboxPolicy> {
        if self.scrub_env {
            Arc::new(ScrubbedEnvironment::default())
        } else {
            Arc::new(Unconfined)
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    // Initialize dependencies in order:
    // 1. Repository / Registry
    // 2. MessagePusher / ProcessRunner
    // 3. UseCases
    // 4. Server

    // 1. Create Repository and Registry (in-memory)
    let repository = Arc::new(InMemoryRoomRepository::new());
    let registry = Arc::new(InMemoryConnectionRegistry::new());

    // 2. Create MessagePusher (WebSocket implementation) and ProcessRunner
    let message_pusher = Arc::new(WebSocketMessagePusher::new());
    let policy = args.sandbox_policy();
    tracing::info!("Executed programs run with the '{}' sandbox policy", policy.name());
    let runner = Arc::new(TokioProcessRunner::new(policy));

    let config = args.run_code_config();
    tracing::info!(
        "Execution jobs: timeout {:?}, at most {} concurrent, workspaces under {}",
        config.timeout,
        config.max_concurrent_jobs,
        config.work_dir.display()
    );

    // 3. Create UseCases
    let usecases = UseCases {
        attach_connection: AttachConnectionUseCase::new(message_pusher.clone()),
        join_room: JoinRoomUseCase::new(
            repository.clone(),
            registry.clone(),
            message_pusher.clone(),
            Arc::new(SystemClock),
        ),
        propagate_edit: PropagateEditUseCase::new(repository.clone(), message_pusher.clone()),
        sync_code: SyncCodeUseCase::new(message_pusher.clone()),
        relay_signal: RelaySignalUseCase::new(message_pusher.clone()),
        disconnect_connection: DisconnectConnectionUseCase::new(
            repository.clone(),
            registry.clone(),
            message_pusher.clone(),
        ),
        run_code: Arc::new(RunCodeUseCase::new(runner, message_pusher, config)),
    };
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(repository.clone(), registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(repository, registry));

    // 4. Create and run the server
    let server = Server::new(usecases, get_rooms_usecase, get_room_detail_usecase);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
