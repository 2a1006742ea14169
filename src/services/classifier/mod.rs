//! # 内容分类器
//!
//! 决定每个内容块应该以何种方式展示。工具输出是非结构化文本，
//! 正确的展示方式取决于**哪个工具产生了它**以及**它位于哪种内容块中**，
//! 这些信息来自 JSONL 的结构，而不是文本本身。
//!
//! ## 两条路径
//! - **结构化路径**（`classify`，置信度恒为 1.0）：按内容块类型和工具名查决策表
//! - **启发式路径**（`heuristic::classify_text`，置信度 < 1.0）：只有裸文本时的兜底
//!
//! ## 结构化决策表（按顺序，先命中者胜出）
//! 1. ToolUse → ToolInput，`json-popup-always`
//! 2. ToolResult 且 `is_error` 或命中错误模式 → ErrorObject，`error-popup-highlighted`
//! 3. ToolResult 且为文件读取工具 → FileContent，`syntax-highlighted-popup`（附带 `file_type`）
//! 4. ToolResult 且为 shell 执行工具 → CommandOutput，`terminal-style-popup`
//! 5. ToolResult 且为外部工具服务器工具（`mcp__`）→ 合法 JSON 为 JsonApiResponse，否则 GenericText
//! 6. ToolResult 且无工具名或不属于以上 → 合法 JSON 为 JsonApiResponse，否则 GenericText
//! 7. Text → GenericText，`adaptive-inline-or-popup`
//!
//! ## 富展示判定
//! - 行数 > 5 或字符数 > 200 → 富展示
//! - JsonApiResponse / ErrorObject / FileContent / CommandOutput 超出紧凑内联窗口
//!   （2 行 / 100 字符）→ 富展示
//! - ToolInput 始终富展示

pub mod detect;
pub mod heuristic;

use crate::models::classification::{
    ClassificationMetadata, ClassificationResult, ContentCategory, STRUCTURAL_CONFIDENCE,
};
use crate::models::message::ContentBlock;
use crate::services::cache::{CacheKey, ClassificationCache};
use crate::utils::text;

pub use heuristic::classify_text;

/// 富展示行数阈值：超过即富展示
pub const RICH_LINE_THRESHOLD: usize = 5;
/// 富展示字符数阈值：超过即富展示
pub const RICH_CHAR_THRESHOLD: usize = 200;
/// 紧凑内联窗口：结构化类别在此窗口内仍可内联展示
pub const COMPACT_LINE_LIMIT: usize = 2;
pub const COMPACT_CHAR_LIMIT: usize = 100;

/// 文件读取类工具
pub const FILE_READ_TOOLS: &[&str] = &["Read", "NotebookRead"];
/// shell 执行类工具
pub const SHELL_TOOLS: &[&str] = &["Bash", "BashOutput"];

/// 判断内容是否需要富展示
///
/// # 参数
/// - `content` - 内容的纯文本
/// - `category` - 分类结果的类别
pub fn is_rich(content: &str, category: ContentCategory) -> bool {
    if category == ContentCategory::ToolInput {
        return true;
    }
    let lines = text::count_lines(content);
    let chars = text::char_count(content);
    if lines > RICH_LINE_THRESHOLD || chars > RICH_CHAR_THRESHOLD {
        return true;
    }
    let compact = lines <= COMPACT_LINE_LIMIT && chars <= COMPACT_CHAR_LIMIT;
    category.is_structured() && !compact
}

/// 结构化分类（不经过缓存）
///
/// # 参数
/// - `block` - 待分类的内容块
/// - `tool_name` - 产生该内容的工具名（工具结果块需要由调用方从关联的调用中提供）
///
/// # 返回值
/// 置信度恒为 1.0 的分类结果
pub fn classify(block: &ContentBlock, tool_name: Option<&str>) -> ClassificationResult {
    match block {
        ContentBlock::ToolUse(tool_use) => {
            let metadata = ClassificationMetadata {
                tool_name: Some(tool_use.name.clone()),
                ..Default::default()
            };
            structural(ContentCategory::ToolInput, true, metadata)
        }
        ContentBlock::ToolResult(result) => {
            classify_tool_result(&result.content.to_text(), result.is_error, tool_name)
        }
        ContentBlock::Text { text } => structural(
            ContentCategory::GenericText,
            is_rich(text, ContentCategory::GenericText),
            ClassificationMetadata::default(),
        ),
    }
}

/// 工具结果的结构化分类（决策表第 2–6 条）
pub fn classify_tool_result(
    content: &str,
    is_error: bool,
    tool_name: Option<&str>,
) -> ClassificationResult {
    let mut metadata = ClassificationMetadata {
        tool_name: tool_name.map(str::to_string),
        ..Default::default()
    };

    let category = if let Some(error_type) = is_error
        .then_some("is_error")
        .or_else(|| detect::match_error_pattern(content))
    {
        metadata.error_type = Some(error_type.to_string());
        ContentCategory::ErrorObject
    } else {
        match tool_name {
            Some(name) if FILE_READ_TOOLS.contains(&name) => {
                metadata.file_type = Some(detect::detect_file_type(content).to_string());
                ContentCategory::FileContent
            }
            Some(name) if SHELL_TOOLS.contains(&name) => ContentCategory::CommandOutput,
            Some(name) if detect::is_mcp_tool(name) => {
                if detect::is_valid_json(content) {
                    metadata.is_mcp_json = true;
                    metadata.api_source = Some(name.to_string());
                    ContentCategory::JsonApiResponse
                } else {
                    ContentCategory::GenericText
                }
            }
            _ => {
                if detect::is_valid_json(content) {
                    ContentCategory::JsonApiResponse
                } else {
                    ContentCategory::GenericText
                }
            }
        }
    };

    structural(category, is_rich(content, category), metadata)
}

fn structural(
    category: ContentCategory,
    rich: bool,
    metadata: ClassificationMetadata,
) -> ClassificationResult {
    ClassificationResult {
        category,
        confidence: STRUCTURAL_CONFIDENCE,
        display_strategy: category.default_strategy(),
        rich,
        metadata,
    }
}

/// 带缓存的分类器
///
/// 由会话树构建方或流式累加器持有，缓存随分类器一起释放。
#[derive(Default)]
pub struct Classifier {
    cache: ClassificationCache,
}

impl Classifier {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            cache: ClassificationCache::new(cache_capacity),
        }
    }

    /// 结构化分类，结果按内容指纹缓存
    pub fn classify(&mut self, block: &ContentBlock, tool_name: Option<&str>) -> ClassificationResult {
        let key = block_key(block, tool_name);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let result = classify(block, tool_name);
        self.cache.put(key, result.clone());
        result
    }

    /// 启发式分类，结果同样缓存（与结构化结果使用不同的键空间）
    pub fn classify_text(&mut self, content: &str) -> ClassificationResult {
        let key = CacheKey {
            kind: KEY_HEURISTIC,
            len: content.len(),
            hash: text::fingerprint(&[content]),
        };
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }
        let result = heuristic::classify_text(content);
        self.cache.put(key, result.clone());
        result
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache(&self) -> &ClassificationCache {
        &self.cache
    }
}

const KEY_TEXT: u8 = 0;
const KEY_TOOL_USE: u8 = 1;
const KEY_TOOL_RESULT: u8 = 2;
const KEY_TOOL_RESULT_ERROR: u8 = 3;
const KEY_HEURISTIC: u8 = 4;

/// 由内容块类型、工具名和内容计算缓存键
fn block_key(block: &ContentBlock, tool_name: Option<&str>) -> CacheKey {
    let tool = tool_name.unwrap_or_default();
    match block {
        ContentBlock::Text { text } => CacheKey {
            kind: KEY_TEXT,
            len: text.len(),
            hash: text::fingerprint(&[text.as_str()]),
        },
        ContentBlock::ToolUse(tool_use) => {
            let input = tool_use.input.to_string();
            CacheKey {
                kind: KEY_TOOL_USE,
                len: input.len(),
                hash: text::fingerprint(&[tool_use.name.as_str(), input.as_str()]),
            }
        }
        ContentBlock::ToolResult(result) => {
            let content = result.content.to_text();
            CacheKey {
                kind: if result.is_error {
                    KEY_TOOL_RESULT_ERROR
                } else {
                    KEY_TOOL_RESULT
                },
                len: content.len(),
                hash: text::fingerprint(&[tool, content.as_str()]),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::DisplayStrategy;
    use crate::models::message::{ToolResultBlock, ToolResultContent, ToolUseBlock};
    use serde_json::json;

    fn tool_result(content: &str, is_error: bool) -> ContentBlock {
        ContentBlock::ToolResult(ToolResultBlock {
            tool_use_id: "t1".into(),
            content: ToolResultContent::Text(content.into()),
            is_error,
        })
    }

    #[test]
    fn test_tool_use_is_tool_input() {
        let block = ContentBlock::ToolUse(ToolUseBlock {
            id: "t1".into(),
            name: "Read".into(),
            input: json!({ "file_path": "x" }),
        });
        let result = classify(&block, None);
        assert_eq!(result.category, ContentCategory::ToolInput);
        assert_eq!(result.display_strategy, DisplayStrategy::JsonPopupAlways);
        assert_eq!(result.confidence, 1.0);
        assert!(result.rich);
        assert_eq!(result.metadata.tool_name.as_deref(), Some("Read"));
    }

    #[test]
    fn test_error_flag_wins_over_tool_table() {
        let result = classify(&tool_result("hello", true), Some("Read"));
        assert_eq!(result.category, ContentCategory::ErrorObject);
        assert_eq!(result.display_strategy, DisplayStrategy::ErrorPopupHighlighted);
        assert_eq!(result.metadata.error_type.as_deref(), Some("is_error"));
    }

    #[test]
    fn test_error_pattern_without_flag() {
        let result = classify(&tool_result("Error: no such file", false), Some("Bash"));
        assert_eq!(result.category, ContentCategory::ErrorObject);
        assert_eq!(result.metadata.error_type.as_deref(), Some("error"));
    }

    #[test]
    fn test_read_is_file_content() {
        let result = classify(&tool_result("hello", false), Some("Read"));
        assert_eq!(result.category, ContentCategory::FileContent);
        assert_eq!(result.display_strategy, DisplayStrategy::SyntaxHighlightedPopup);
        assert_eq!(result.metadata.file_type.as_deref(), Some("text"));
        assert!(!result.rich);
    }

    #[test]
    fn test_bash_is_command_output() {
        let result = classify(&tool_result("a\nb\nc", false), Some("Bash"));
        assert_eq!(result.category, ContentCategory::CommandOutput);
        assert_eq!(result.display_strategy, DisplayStrategy::TerminalStylePopup);
        // 3 行超出紧凑内联窗口
        assert!(result.rich);
    }

    #[test]
    fn test_mcp_json_and_text() {
        let json_result = classify(&tool_result(r#"{"ok": true}"#, false), Some("mcp__gh__list"));
        assert_eq!(json_result.category, ContentCategory::JsonApiResponse);
        assert_eq!(json_result.display_strategy, DisplayStrategy::JsonPopupWithFolding);
        assert!(json_result.metadata.is_mcp_json);
        assert_eq!(json_result.metadata.api_source.as_deref(), Some("mcp__gh__list"));

        let text_result = classify(&tool_result("plain words", false), Some("mcp__gh__list"));
        assert_eq!(text_result.category, ContentCategory::GenericText);
        assert!(!text_result.metadata.is_mcp_json);
    }

    #[test]
    fn test_unknown_tool_falls_back_to_json_check() {
        let result = classify(&tool_result("[1, 2]", false), None);
        assert_eq!(result.category, ContentCategory::JsonApiResponse);
        assert!(!result.metadata.is_mcp_json);
        let result = classify(&tool_result("[1, 2", false), Some("Grep"));
        assert_eq!(result.category, ContentCategory::GenericText);
        assert_eq!(result.confidence, 1.0);
    }

    #[test]
    fn test_text_block_is_generic() {
        let block = ContentBlock::Text {
            text: "prose".into(),
        };
        let result = classify(&block, None);
        assert_eq!(result.category, ContentCategory::GenericText);
        assert_eq!(result.display_strategy, DisplayStrategy::AdaptiveInlineOrPopup);
    }

    #[test]
    fn test_rich_threshold_boundaries() {
        // 5 行、共 200 字符：不触发富展示
        let line = "x".repeat(39);
        let five_lines = vec![line.clone(); 5].join("\n");
        assert_eq!(text::count_lines(&five_lines), 5);
        assert_eq!(text::char_count(&five_lines), 199);
        let exactly_200 = format!("{}y", five_lines);
        assert_eq!(text::char_count(&exactly_200), 200);
        assert!(!is_rich(&exactly_200, ContentCategory::GenericText));

        // 6 行：触发
        let six_lines = vec!["x"; 6].join("\n");
        assert!(is_rich(&six_lines, ContentCategory::GenericText));

        // 201 字符单行：触发
        assert!(is_rich(&"z".repeat(201), ContentCategory::GenericText));
        assert!(!is_rich(&"z".repeat(200), ContentCategory::GenericText));
    }

    #[test]
    fn test_threshold_through_classify() {
        let exactly = tool_result(&"z".repeat(200), false);
        let over = tool_result(&"z".repeat(201), false);
        assert!(!classify(&exactly, None).rich);
        assert!(classify(&over, None).rich);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let block = tool_result(r#"{"a": 1}"#, false);
        let first = classify(&block, Some("mcp__x__y"));
        for _ in 0..5 {
            assert_eq!(classify(&block, Some("mcp__x__y")), first);
        }
    }

    #[test]
    fn test_cached_classifier_matches_uncached() {
        let mut classifier = Classifier::new(8);
        let block = tool_result("fn main() {}", false);
        let uncached = classify(&block, Some("Read"));
        assert_eq!(classifier.classify(&block, Some("Read")), uncached);
        assert_eq!(classifier.classify(&block, Some("Read")), uncached);
        assert_eq!(classifier.cache().stats(), (1, 1));

        // 同一内容、不同工具名不会串用缓存
        let as_bash = classifier.classify(&block, Some("Bash"));
        assert_eq!(as_bash.category, ContentCategory::CommandOutput);

        classifier.clear_cache();
        assert!(classifier.cache().is_empty());
        assert_eq!(classifier.classify(&block, Some("Read")), uncached);
    }
}
