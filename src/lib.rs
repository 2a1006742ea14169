//! # claude-code-tree - 会话树构建核心
//!
//! 将 Claude Code 流式输出的 JSONL 记录转换为带分类信息的可折叠会话树。
//!
//! ## 处理管线
//! ```text
//! 原始行 → parse_lines → 合并分片 → 工具关联 → 内容分类 → build_tree → Session 根节点
//! ```
//!
//! 整个管线同步、单线程运行，一次处理内存中的一批行。
//! 单行解析失败或单个内容块异常只影响其自身，其余内容照常处理。
//!
//! ## 对外入口
//! - `parse_lines` - 原始行 → 消息 + 行级错误（未合并）
//! - `parse_transcript` - 原始行 → 合并后的消息 + 行级错误
//! - `build_tree` - 消息 → 会话树
//! - `classify` - 对单个内容块按需分类
//!
//! ## 模块结构
//! - `commands/` - 命令行子命令
//! - `models/` - 数据模型
//! - `services/` - 管线各阶段
//! - `utils/` - 通用工具函数

pub mod commands;
pub mod models;
pub mod services;
pub mod utils;

pub use models::classification::{ClassificationResult, ContentCategory, DisplayStrategy};
pub use models::message::{ContentBlock, Message};
pub use models::tree::{NodeKind, SessionInfo, SessionNode, TreeNode};
pub use services::classifier::{classify, classify_text, Classifier};
pub use services::consolidator::consolidate;
pub use services::live::LiveTranscript;
pub use services::parser::{parse_line, parse_lines, LineError, ParseError};
pub use services::tree_builder::{build_tree, build_tree_with};

/// 解析并合并：一步得到可直接交给 `build_tree` 的消息列表
///
/// # 参数
/// - `lines` - 按顺序排列的原始行
///
/// # 返回值
/// `(messages, errors)`：合并后的消息和所有行级错误
pub fn parse_transcript<I, S>(lines: I) -> (Vec<Message>, Vec<LineError>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (raw, errors) = parse_lines(lines);
    (consolidate(&raw), errors)
}
