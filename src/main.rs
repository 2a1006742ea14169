//! # claude-code-tree 命令行入口
//!
//! 初始化日志后解析参数并分派到 `tree_lib::commands`。
//! 库内部通过 `log` 宏记录日志，由 tracing-subscriber 的 log 桥接统一输出到 stderr。

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tree_lib::commands::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    // RUST_LOG 优先；未设置时默认 warn，--verbose 提升到 debug
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = commands::run(cli).await {
        eprintln!("claude-code-tree: {err:#}");
        std::process::exit(2);
    }
}
