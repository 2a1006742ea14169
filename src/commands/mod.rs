//! # 命令行处理模块
//!
//! 每个子模块对应一个子命令：
//! - `tree` - 解析会话文件并输出会话树（大纲或 JSON）
//! - `classify` - 列出每个工具结果的分类
//! - `settings` - 设置文件的加载与查看
//!
//! 命令层负责 I/O 与输出，错误统一用 `anyhow` 汇总后交给 `main` 打印。

pub mod classify;
pub mod settings;
pub mod tree;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "claude-code-tree",
    version,
    about = "Build a collapsible tree from Claude Code JSONL transcripts"
)]
pub struct Cli {
    /// Path to settings.json (defaults to the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the classification cache capacity
    #[arg(long, global = true)]
    pub cache_capacity: Option<usize>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the session tree of a transcript
    Tree {
        /// Path to the JSONL transcript
        file: PathBuf,

        /// Print the tree as JSON instead of an outline
        #[arg(long)]
        json: bool,

        /// Only read the first N lines
        #[arg(long)]
        sample: Option<usize>,
    },

    /// List every tool result with its classification
    Classify {
        /// Path to the JSONL transcript
        file: PathBuf,

        /// Also show the heuristic classification of each result
        #[arg(long)]
        heuristic: bool,

        /// Only read the first N lines
        #[arg(long)]
        sample: Option<usize>,
    },

    /// Show the effective settings
    Settings,
}

/// 执行解析后的命令
pub async fn run(cli: Cli) -> Result<()> {
    let settings_path = crate::utils::path::resolve_settings_path(cli.config.as_deref())
        .map_err(anyhow::Error::msg)?;
    let file_settings = settings::load_settings(&settings_path).await?;

    match cli.command {
        Commands::Tree { file, json, sample } => {
            let settings = settings::apply_overrides(file_settings, cli.cache_capacity, sample);
            tree::run_tree(&file, json, &settings).await
        }
        Commands::Classify {
            file,
            heuristic,
            sample,
        } => {
            let settings = settings::apply_overrides(file_settings, cli.cache_capacity, sample);
            classify::run_classify(&file, heuristic, &settings).await
        }
        Commands::Settings => {
            let settings = settings::apply_overrides(file_settings, cli.cache_capacity, None);
            settings::show_settings(&settings_path, &settings)
        }
    }
}
