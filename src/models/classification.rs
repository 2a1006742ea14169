//! # 内容分类数据模型
//!
//! 定义 Content Classifier 的输出结构。分类结果不持久化，
//! 每次构建会话树时重新计算（或从分类缓存中命中）。
//!
//! 字符串取值（如 `"json-popup-with-folding"`）是与渲染层之间的约定，
//! 渲染层根据 `display_strategy` 选择弹窗 / 高亮 / 内联等展示方式。

use serde::Serialize;

/// 结构化分类路径的置信度：由 JSONL 结构推导，结果确定
pub const STRUCTURAL_CONFIDENCE: f32 = 1.0;

/// 内容类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ContentCategory {
    /// 工具调用参数
    ToolInput,
    /// 外部 API / 工具服务器返回的 JSON
    JsonApiResponse,
    /// 结构化错误
    ErrorObject,
    /// 文件内容（文件读取类工具的结果）
    FileContent,
    /// 命令输出（shell 执行类工具的结果）
    CommandOutput,
    /// 普通文本
    GenericText,
}

impl ContentCategory {
    /// 该类别是否属于结构化内容（超出紧凑内联窗口时强制使用富展示）
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Self::JsonApiResponse | Self::ErrorObject | Self::FileContent | Self::CommandOutput
        )
    }

    /// 默认展示策略
    pub fn default_strategy(&self) -> DisplayStrategy {
        match self {
            Self::ToolInput => DisplayStrategy::JsonPopupAlways,
            Self::JsonApiResponse => DisplayStrategy::JsonPopupWithFolding,
            Self::ErrorObject => DisplayStrategy::ErrorPopupHighlighted,
            Self::FileContent => DisplayStrategy::SyntaxHighlightedPopup,
            Self::CommandOutput => DisplayStrategy::TerminalStylePopup,
            Self::GenericText => DisplayStrategy::AdaptiveInlineOrPopup,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::ToolInput => "tool input",
            Self::JsonApiResponse => "json",
            Self::ErrorObject => "error",
            Self::FileContent => "file",
            Self::CommandOutput => "output",
            Self::GenericText => "text",
        }
    }
}

/// 展示策略：告诉渲染层应该如何呈现内容
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayStrategy {
    JsonPopupWithFolding,
    SyntaxHighlightedPopup,
    TerminalStylePopup,
    ErrorPopupHighlighted,
    AdaptiveInlineOrPopup,
    JsonPopupAlways,
}

impl DisplayStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonPopupWithFolding => "json-popup-with-folding",
            Self::SyntaxHighlightedPopup => "syntax-highlighted-popup",
            Self::TerminalStylePopup => "terminal-style-popup",
            Self::ErrorPopupHighlighted => "error-popup-highlighted",
            Self::AdaptiveInlineOrPopup => "adaptive-inline-or-popup",
            Self::JsonPopupAlways => "json-popup-always",
        }
    }
}

/// 分类附加信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationMetadata {
    /// 产生该内容的工具名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
    /// 推断出的文件类型（仅 FileContent）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    /// 内容是否为外部工具服务器返回的合法 JSON
    pub is_mcp_json: bool,
    /// JSON 来源（外部工具服务器的完整工具名）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_source: Option<String>,
    /// 命中的错误模式
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

/// 分类结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub category: ContentCategory,
    /// 置信度 [0, 1]：结构化路径恒为 1.0，启发式路径更低
    pub confidence: f32,
    pub display_strategy: DisplayStrategy,
    /// 是否需要富展示（弹窗 / 展开视图）
    pub rich: bool,
    pub metadata: ClassificationMetadata,
}
