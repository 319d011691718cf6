//! Logging setup for the Pairroom binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose spans and events are enabled at the default level.
const PAIRROOM_CRATES: [&str; 2] = ["pairroom_server", "pairroom_shared"];

/// Initialize the tracing subscriber with the specified default log level.
///
/// The default filter enables the Pairroom library crates and the binary
/// itself at `default_log_level`. `RUST_LOG` overrides it entirely.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "pairroom-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info")
///
/// # Examples
///
/// ```no_run
/// use pairroom_shared::logger::setup_logger;
///
/// setup_logger("pairroom-server", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Build the `EnvFilter` directive used when `RUST_LOG` is not set.
fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    PAIRROOM_CRATES
        .iter()
        .copied()
        .chain(std::iter::once(binary_name))
        .map(|target| format!("{}={}", target.replace('-', "_"), default_log_level))
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_includes_binary_and_crates() {
        // テスト項目: デフォルトのフィルタにライブラリとバイナリが含まれる
        // given (前提条件):
        let binary_name = "pairroom-server";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            filter,
            "pairroom_server=debug,pairroom_shared=debug,pairroom_server=debug"
        );
    }

    #[test]
    fn test_default_filter_normalizes_hyphens() {
        // テスト項目: バイナリ名のハイフンがアンダースコアに変換される
        // given (前提条件):
        let binary_name = "my-tool";

        // when (操作):
        let filter = default_filter(binary_name, "info");

        // then (期待する結果):
        assert!(filter.ends_with("my_tool=info"));
        assert!(!filter.contains('-'));
    }
}
