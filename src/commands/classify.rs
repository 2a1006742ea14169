//! # classify 命令
//!
//! 列出会话中每个工具结果的分类：工具名、类别、展示策略、置信度、是否富展示。
//! 加上 `--heuristic` 时额外给出启发式路径的判断，便于对照两条路径的差异。

use std::path::Path;

use anyhow::Result;

use crate::models::classification::ClassificationResult;
use crate::models::message::{ContentBlock, Message};
use crate::models::settings::ViewerSettings;
use crate::services::classifier::Classifier;
use crate::services::linker::build_index;
use crate::services::{consolidator, parser, source};

/// 单个工具结果的分类行
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedResult {
    pub tool_use_id: String,
    pub tool_name: Option<String>,
    pub structural: ClassificationResult,
    pub heuristic: Option<ClassificationResult>,
}

/// 执行 classify 命令
pub async fn run_classify(file: &Path, heuristic: bool, settings: &ViewerSettings) -> Result<()> {
    let lines = source::load_lines(file, settings.sample_lines).await?;
    let (raw, errors) = parser::parse_lines(&lines);
    super::tree::report_errors(&errors);

    let messages = consolidator::consolidate(&raw);
    let mut classifier = Classifier::new(settings.classification_cache_capacity);
    let rows = classify_results(&mut classifier, &messages, heuristic);

    for row in &rows {
        println!("{}", format_row(row));
    }
    println!("{} 个工具结果", rows.len());
    Ok(())
}

/// 对消息列表中的所有工具结果分类（按出现顺序）
///
/// 工具名通过关联索引从对应的工具调用中取得；找不到调用的结果以无工具名的方式分类。
pub fn classify_results(
    classifier: &mut Classifier,
    messages: &[Message],
    with_heuristic: bool,
) -> Vec<ClassifiedResult> {
    let index = build_index(messages);
    let mut rows = Vec::new();

    for msg in messages {
        for block in msg.content_blocks() {
            let ContentBlock::ToolResult(result) = block else {
                continue;
            };
            let tool_name = index
                .find_tool_use(&result.tool_use_id)
                .map(|tool_use| tool_use.name.clone());
            let structural = classifier.classify(block, tool_name.as_deref());
            let heuristic = with_heuristic.then(|| classifier.classify_text(&result.content.to_text()));
            rows.push(ClassifiedResult {
                tool_use_id: result.tool_use_id.clone(),
                tool_name,
                structural,
                heuristic,
            });
        }
    }

    rows
}

fn format_row(row: &ClassifiedResult) -> String {
    let c = &row.structural;
    let mut line = format!(
        "{}\t{}\t{}\t{}\t{:.1}\t{}",
        row.tool_use_id,
        row.tool_name.as_deref().unwrap_or("-"),
        c.category.label(),
        c.display_strategy.as_str(),
        c.confidence,
        if c.rich { "rich" } else { "inline" }
    );
    if let Some(h) = &row.heuristic {
        line.push_str(&format!("\t(heuristic: {} {:.1})", h.category.label(), h.confidence));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::ContentCategory;

    #[test]
    fn test_results_use_linked_tool_names() {
        let lines = [
            r#"{"type":"assistant","message":{"id":"a1","role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"ls"}}]}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"a\nb\nc"},{"type":"tool_result","tool_use_id":"ghost","content":"{\"x\":1}"}]}}"#,
        ];
        let (raw, _) = parser::parse_lines(lines);
        let messages = consolidator::consolidate(&raw);
        let mut classifier = Classifier::new(8);
        let rows = classify_results(&mut classifier, &messages, true);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].tool_name.as_deref(), Some("Bash"));
        assert_eq!(rows[0].structural.category, ContentCategory::CommandOutput);
        assert!(rows[0].heuristic.is_some());

        assert_eq!(rows[1].tool_name, None);
        assert_eq!(rows[1].structural.category, ContentCategory::JsonApiResponse);
        assert_eq!(rows[1].structural.confidence, 1.0);

        let line = format_row(&rows[0]);
        assert!(line.starts_with("t1\tBash\toutput\tterminal-style-popup\t1.0\trich"));
    }
}
