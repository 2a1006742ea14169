//! # tree 命令
//!
//! 读取会话文件，经过 解析 → 合并 → 构建 三个阶段后输出会话树。
//! 解析失败的行逐条输出到 stderr，其余内容照常展示。

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::settings::ViewerSettings;
use crate::models::tree::{NodeKind, TreeNode};
use crate::services::classifier::Classifier;
use crate::services::parser::LineError;
use crate::services::tree_builder::build_tree_with;
use crate::services::{consolidator, parser, source};

/// 执行 tree 命令
///
/// # 参数
/// - `file` - JSONL 会话文件路径
/// - `json` - 为 true 时输出 JSON，否则输出缩进大纲
/// - `settings` - 合并命令行参数后的设置
pub async fn run_tree(file: &Path, json: bool, settings: &ViewerSettings) -> Result<()> {
    let lines = source::load_lines(file, settings.sample_lines).await?;
    let (raw, errors) = parser::parse_lines(&lines);
    report_errors(&errors);

    let messages = consolidator::consolidate(&raw);
    let mut classifier = Classifier::new(settings.classification_cache_capacity);
    let root = build_tree_with(&mut classifier, &messages, None);

    if json {
        let out = serde_json::to_string_pretty(&root).context("序列化会话树失败")?;
        println!("{}", out);
    } else {
        print!("{}", render_outline(&root));
    }
    Ok(())
}

/// 输出行级解析错误，不中断命令
pub fn report_errors(errors: &[LineError]) {
    if errors.is_empty() {
        return;
    }
    for error in errors {
        eprintln!("{}", error);
    }
    eprintln!("{} 行解析失败，已跳过", errors.len());
}

/// 将会话树渲染为缩进大纲
///
/// 每个节点一行，按深度缩进两个空格；Result 节点附带分类信息：
/// ```text
/// Session s1 (m1)
///   Used 1 tools: Read
///     Read: x.txt
///       Result (file) [file, syntax-highlighted-popup]
///         hello
/// ```
pub fn render_outline(root: &TreeNode) -> String {
    let mut out = String::new();
    for (depth, node) in root.walk() {
        let indent = "  ".repeat(depth);
        let _ = match &node.kind {
            NodeKind::Result(data) => {
                let c = &data.classification;
                writeln!(
                    out,
                    "{}{} [{}, {}{}]",
                    indent,
                    node.display_text,
                    c.category.label(),
                    c.display_strategy.as_str(),
                    if c.rich { ", rich" } else { "" }
                )
            }
            _ => writeln!(out, "{}{}", indent, node.display_text),
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tree_builder::build_tree;

    #[test]
    fn test_outline_shape() {
        let lines = [
            r#"{"type":"system","subtype":"init","session_id":"s1","model":"m1"}"#,
            r#"{"type":"assistant","message":{"id":"a1","role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Read","input":{"file_path":"x.txt"}}]}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"hello"}]}}"#,
        ];
        let (raw, _) = parser::parse_lines(lines);
        let root = build_tree(&consolidator::consolidate(&raw), None);
        let outline = render_outline(&root);
        let expected = "\
Session s1 (m1)
  Used 1 tools: Read
    Read: x.txt
      Result (file) [file, syntax-highlighted-popup]
        hello
";
        assert_eq!(outline, expected);
    }

    #[tokio::test]
    async fn test_run_tree_on_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.jsonl");
        std::fs::write(&path, "not json\n{\"type\":\"summary\",\"summary\":\"x\"}\n").unwrap();
        run_tree(&path, true, &ViewerSettings::default()).await.unwrap();
    }
}
