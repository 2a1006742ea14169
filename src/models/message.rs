//! # 消息数据模型
//!
//! 定义了 Claude Code 流式 JSONL 输出中每条记录解析后的强类型结构：
//! - `Message` - 一条逻辑消息（公共字段 + 按类型区分的消息体）
//! - `MessageBody` - 闭合的消息类型和类型（System / Assistant / User / Result / Summary）
//! - `ContentBlock` - 消息内容块（文本 / 工具调用 / 工具结果）
//!
//! ## 设计决策
//! - 消息类型使用枚举而非动态分派：每个消费点都通过穷尽的 `match` 处理全部类型，
//!   新增类型时编译器会指出所有需要更新的位置。
//! - 模型只承载数据，行为全部放在 `services/` 下的各个组件中。
//! - 工具调用的输入参数保留为 `serde_json::Value`，因为不同工具的参数结构各不相同。

use serde::Serialize;
use serde_json::Value;

/// 消息类型标签
///
/// 对应 JSONL 记录中 `type` 字段可识别的五个取值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    System,
    Assistant,
    User,
    Result,
    Summary,
}

impl MessageKind {
    /// 由 JSONL 的 `type` 字段值解析出消息类型
    ///
    /// # 返回值
    /// - `Some(kind)` - 可识别的类型
    /// - `None` - 未知类型（如 `file-history-snapshot`、`progress` 等）
    pub fn from_type_tag(tag: &str) -> Option<Self> {
        match tag {
            "system" => Some(Self::System),
            "assistant" => Some(Self::Assistant),
            "user" => Some(Self::User),
            "result" => Some(Self::Result),
            "summary" => Some(Self::Summary),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Assistant => "assistant",
            Self::User => "user",
            Self::Result => "result",
            Self::Summary => "summary",
        }
    }
}

/// 一条逻辑消息
///
/// 由 Line Parser 从一条 JSONL 记录创建。assistant 消息在合并阶段可能被追加内容块，
/// 合并完成后即视为只读，由 Tool Linker、Content Classifier 和 Tree Builder 消费。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// 子类型，如 "init"、"success"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,
    /// 会话 ID：原始数据中可能是 `session_id` 或 `sessionId`，解析时统一到此字段
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    /// 子 agent 调用所属的父工具调用 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
    /// 记录自身的 UUID（转录文件格式才有，流式输出通常没有）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// 按类型区分的消息体
    pub body: MessageBody,
}

/// 消息体：闭合的类型和类型
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MessageBody {
    System(SystemInfo),
    Assistant(Conversation),
    User(Conversation),
    Result(ResultInfo),
    Summary(SummaryInfo),
}

/// system 记录携带的会话环境信息（主要来自 `subtype = "init"`）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    /// init 记录中声明的可用工具列表
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<String>,
}

/// assistant / user 记录共用的对话结构
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// 逻辑消息 ID（`message.id`），同一 assistant 回合的多条记录共享此 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// 按到达顺序排列的内容块
    pub content_blocks: Vec<ContentBlock>,
}

/// result 记录：一次运行结束时的统计信息
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_turns: Option<u64>,
    pub is_error: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// summary 记录：会话摘要
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryInfo {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaf_uuid: Option<String>,
}

/// 消息内容块
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse(ToolUseBlock),
    ToolResult(ToolResultBlock),
}

/// 工具调用块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolUseBlock {
    pub id: String,
    /// 工具名，外部工具服务器注册的工具采用 `mcp__server__tool` 形式
    pub name: String,
    pub input: Value,
}

/// 工具结果块
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolResultBlock {
    pub tool_use_id: String,
    pub content: ToolResultContent,
    pub is_error: bool,
}

/// 工具结果内容：字符串或嵌套内容列表
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolResultContent {
    Text(String),
    Blocks(Vec<Value>),
}

impl ToolResultContent {
    /// 提取工具结果的纯文本视图
    ///
    /// - 字符串格式：直接返回
    /// - 数组格式：提取所有 `type === "text"` 项的 text 字段，用换行符拼接
    pub fn to_text(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Blocks(items) => items
                .iter()
                .filter(|item| item.get("type").and_then(|v| v.as_str()) == Some("text"))
                .filter_map(|item| item.get("text").and_then(|v| v.as_str()))
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

impl Message {
    /// 消息类型标签
    pub fn kind(&self) -> MessageKind {
        match &self.body {
            MessageBody::System(_) => MessageKind::System,
            MessageBody::Assistant(_) => MessageKind::Assistant,
            MessageBody::User(_) => MessageKind::User,
            MessageBody::Result(_) => MessageKind::Result,
            MessageBody::Summary(_) => MessageKind::Summary,
        }
    }

    /// 对话结构（仅 assistant / user 消息）
    pub fn conversation(&self) -> Option<&Conversation> {
        match &self.body {
            MessageBody::Assistant(c) | MessageBody::User(c) => Some(c),
            _ => None,
        }
    }

    /// 内容块列表，非对话消息返回空切片
    pub fn content_blocks(&self) -> &[ContentBlock] {
        self.conversation()
            .map(|c| c.content_blocks.as_slice())
            .unwrap_or(&[])
    }

    /// 逻辑消息 ID（仅 assistant 消息参与合并，因此只对 assistant 返回）
    pub fn message_id(&self) -> Option<&str> {
        match &self.body {
            MessageBody::Assistant(c) => c.message_id.as_deref(),
            _ => None,
        }
    }

    /// 遍历消息中的所有工具调用块
    pub fn tool_uses(&self) -> impl Iterator<Item = &ToolUseBlock> {
        self.content_blocks().iter().filter_map(|block| match block {
            ContentBlock::ToolUse(tool_use) => Some(tool_use),
            _ => None,
        })
    }

    /// 遍历消息中的所有工具结果块
    pub fn tool_results(&self) -> impl Iterator<Item = &ToolResultBlock> {
        self.content_blocks().iter().filter_map(|block| match block {
            ContentBlock::ToolResult(result) => Some(result),
            _ => None,
        })
    }

    /// 第一个文本块的内容
    pub fn first_text(&self) -> Option<&str> {
        self.content_blocks().iter().find_map(|block| match block {
            ContentBlock::Text { text } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assistant(blocks: Vec<ContentBlock>) -> Message {
        Message {
            subtype: None,
            session_id: None,
            parent_tool_use_id: None,
            uuid: None,
            body: MessageBody::Assistant(Conversation {
                message_id: Some("a1".into()),
                model: None,
                content_blocks: blocks,
            }),
        }
    }

    #[test]
    fn test_tool_result_text_joins_text_items() {
        let content = ToolResultContent::Blocks(vec![
            json!({ "type": "text", "text": "line one" }),
            json!({ "type": "image", "source": {} }),
            json!({ "type": "text", "text": "line two" }),
        ]);
        assert_eq!(content.to_text(), "line one\nline two");
    }

    #[test]
    fn test_accessors_filter_blocks_by_type() {
        let msg = assistant(vec![
            ContentBlock::Text {
                text: "hi".into(),
            },
            ContentBlock::ToolUse(ToolUseBlock {
                id: "t1".into(),
                name: "Read".into(),
                input: json!({}),
            }),
        ]);
        assert_eq!(msg.kind(), MessageKind::Assistant);
        assert_eq!(msg.message_id(), Some("a1"));
        assert_eq!(msg.first_text(), Some("hi"));
        assert_eq!(msg.tool_uses().count(), 1);
        assert_eq!(msg.tool_results().count(), 0);
    }

    #[test]
    fn test_type_tag_round_trip() {
        for kind in [
            MessageKind::System,
            MessageKind::Assistant,
            MessageKind::User,
            MessageKind::Result,
            MessageKind::Summary,
        ] {
            assert_eq!(MessageKind::from_type_tag(kind.as_str()), Some(kind));
        }
        assert_eq!(MessageKind::from_type_tag("progress"), None);
    }
}
