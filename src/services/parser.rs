//! # JSONL 行解析服务
//!
//! 将 Claude Code 流式输出的单行 JSON 记录解析为强类型的 `Message`。
//!
//! ## 容错策略
//! - 空行 / 纯空白行：返回 `Ok(None)`，流式输出中的空行是正常现象
//! - 非法 JSON：返回 `ParseError::Decode`，携带原始解码错误信息
//! - 缺少 `type` 判别字段：返回 `ParseError::MissingField("type")`
//! - 未知的记录类型（`file-history-snapshot`、`progress` 等）：返回 `Ok(None)` 并记录 debug 日志
//! - 单个内容块缺少必需字段：跳过该块，保留消息的其余内容
//!
//! 批量解析时每一行独立处理，第 N 行失败不会影响第 N+1 行及之后的解析。
//! 本模块不做任何 I/O，行数据由 `services::source` 或调用方提供。

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::message::{
    ContentBlock, Conversation, Message, MessageBody, MessageKind, ResultInfo, SummaryInfo,
    SystemInfo, ToolResultBlock, ToolResultContent, ToolUseBlock,
};

/// 单行解析错误
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// 不是合法 JSON
    #[error("JSON 解码失败: {0}")]
    Decode(String),

    /// 合法 JSON，但不是对象
    #[error("记录不是 JSON 对象")]
    NotAnObject,

    /// 缺少必需字段（如 `type` 判别字段、assistant/user 记录的 `message`）
    #[error("缺少必需字段 `{0}`")]
    MissingField(&'static str),

    /// 内容块缺少其声明类型所需的字段，该块被跳过
    #[error("内容块 `{block}` 缺少必需字段 `{field}`")]
    InvalidBlock { block: String, field: &'static str },
}

/// 带行号的解析错误（行号从 1 开始）
#[derive(Debug, Clone, PartialEq, Error)]
#[error("第 {line} 行: {error}")]
pub struct LineError {
    pub line: usize,
    pub error: ParseError,
}

/// 单条记录的解析结果：消息本身 + 被跳过的内容块错误
struct ParsedRecord {
    message: Message,
    skipped_blocks: Vec<ParseError>,
}

/// 解析单行 JSONL 记录
///
/// # 参数
/// - `raw` - 一行原始文本（可带首尾空白）
///
/// # 返回值
/// - `Ok(Some(message))` - 解析成功
/// - `Ok(None)` - 空行或未知记录类型，调用方应直接跳过
///
/// # 错误
/// JSON 非法、不是对象或缺少 `type` 字段时返回 `ParseError`。
/// 内容块级别的问题不会导致整行失败，只记录 warn 日志。
pub fn parse_line(raw: &str) -> Result<Option<Message>, ParseError> {
    let Some(record) = parse_record(raw)? else {
        return Ok(None);
    };
    for issue in &record.skipped_blocks {
        log::warn!("跳过无效内容块: {}", issue);
    }
    Ok(Some(record.message))
}

/// 批量解析 JSONL 行
///
/// 每一行独立尝试解析，失败的行连同行号（从 1 开始）收集到错误列表中，
/// 不会中断其余行的解析。内容块级别的错误同样以所在行号记录。
///
/// # 参数
/// - `lines` - 按顺序排列的原始行
///
/// # 返回值
/// `(messages, errors)`：成功解析的消息（保持输入顺序）和所有行级错误
pub fn parse_lines<I, S>(lines: I) -> (Vec<Message>, Vec<LineError>)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut messages = Vec::new();
    let mut errors = Vec::new();

    for (index, line) in lines.into_iter().enumerate() {
        let line_no = index + 1;
        match parse_record(line.as_ref()) {
            Ok(Some(record)) => {
                errors.extend(record.skipped_blocks.into_iter().map(|error| LineError {
                    line: line_no,
                    error,
                }));
                messages.push(record.message);
            }
            Ok(None) => {}
            Err(error) => {
                log::debug!("第 {} 行解析失败: {}", line_no, error);
                errors.push(LineError {
                    line: line_no,
                    error,
                });
            }
        }
    }

    (messages, errors)
}

fn parse_record(raw: &str) -> Result<Option<ParsedRecord>, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| ParseError::Decode(e.to_string()))?;
    let Value::Object(obj) = &value else {
        return Err(ParseError::NotAnObject);
    };

    let tag = str_field(obj, "type").ok_or(ParseError::MissingField("type"))?;
    let Some(kind) = MessageKind::from_type_tag(tag) else {
        log::debug!("跳过未知类型的记录: {}", tag);
        return Ok(None);
    };

    let mut skipped_blocks = Vec::new();
    let body = match kind {
        MessageKind::System => MessageBody::System(parse_system(obj)),
        MessageKind::Assistant => {
            MessageBody::Assistant(parse_conversation(obj, &mut skipped_blocks)?)
        }
        MessageKind::User => MessageBody::User(parse_conversation(obj, &mut skipped_blocks)?),
        MessageKind::Result => MessageBody::Result(parse_result(obj)),
        MessageKind::Summary => MessageBody::Summary(parse_summary(obj)),
    };

    let message = Message {
        subtype: owned_str_field(obj, "subtype"),
        // 两种历史字段名都接受，`session_id` 优先
        session_id: owned_str_field(obj, "session_id")
            .or_else(|| owned_str_field(obj, "sessionId")),
        parent_tool_use_id: owned_str_field(obj, "parent_tool_use_id")
            .or_else(|| owned_str_field(obj, "parentToolUseID")),
        uuid: owned_str_field(obj, "uuid"),
        body,
    };

    Ok(Some(ParsedRecord {
        message,
        skipped_blocks,
    }))
}

fn parse_system(obj: &Map<String, Value>) -> SystemInfo {
    let tools = obj
        .get("tools")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    SystemInfo {
        model: owned_str_field(obj, "model"),
        cwd: owned_str_field(obj, "cwd"),
        tools,
    }
}

/// 解析 assistant / user 记录的 `message` 对象
///
/// `message.content` 支持两种格式：
/// - 字符串：包装为单个 Text 块
/// - 数组：逐块解析，未知类型的块（thinking、image 等）静默跳过，
///   缺少必需字段的块记入 `skipped`
fn parse_conversation(
    obj: &Map<String, Value>,
    skipped: &mut Vec<ParseError>,
) -> Result<Conversation, ParseError> {
    let message = obj
        .get("message")
        .and_then(Value::as_object)
        .ok_or(ParseError::MissingField("message"))?;

    let content_blocks = match message.get("content") {
        Some(Value::String(text)) => vec![ContentBlock::Text { text: text.clone() }],
        Some(Value::Array(items)) => {
            let mut blocks = Vec::with_capacity(items.len());
            for item in items {
                match parse_block(item) {
                    Ok(Some(block)) => blocks.push(block),
                    Ok(None) => {}
                    Err(error) => skipped.push(error),
                }
            }
            blocks
        }
        _ => Vec::new(),
    };

    Ok(Conversation {
        message_id: owned_str_field(message, "id"),
        model: owned_str_field(message, "model"),
        content_blocks,
    })
}

fn parse_block(item: &Value) -> Result<Option<ContentBlock>, ParseError> {
    let Some(block) = item.as_object() else {
        return Err(ParseError::InvalidBlock {
            block: "<non-object>".into(),
            field: "type",
        });
    };
    let Some(block_type) = str_field(block, "type") else {
        return Err(ParseError::InvalidBlock {
            block: "<untyped>".into(),
            field: "type",
        });
    };

    let missing = |field: &'static str| ParseError::InvalidBlock {
        block: block_type.to_string(),
        field,
    };

    match block_type {
        "text" => {
            let text = owned_str_field(block, "text").ok_or_else(|| missing("text"))?;
            Ok(Some(ContentBlock::Text { text }))
        }
        "tool_use" => {
            let id = owned_str_field(block, "id").ok_or_else(|| missing("id"))?;
            let name = owned_str_field(block, "name").ok_or_else(|| missing("name"))?;
            let input = block
                .get("input")
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            Ok(Some(ContentBlock::ToolUse(ToolUseBlock { id, name, input })))
        }
        "tool_result" => {
            let tool_use_id =
                owned_str_field(block, "tool_use_id").ok_or_else(|| missing("tool_use_id"))?;
            let content = match block.get("content") {
                Some(Value::String(s)) => ToolResultContent::Text(s.clone()),
                Some(Value::Array(items)) => ToolResultContent::Blocks(items.clone()),
                None | Some(Value::Null) => ToolResultContent::Text(String::new()),
                Some(other) => ToolResultContent::Text(other.to_string()),
            };
            let is_error = block
                .get("is_error")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            Ok(Some(ContentBlock::ToolResult(ToolResultBlock {
                tool_use_id,
                content,
                is_error,
            })))
        }
        _ => Ok(None),
    }
}

fn parse_result(obj: &Map<String, Value>) -> ResultInfo {
    ResultInfo {
        // 新版字段名为 total_cost_usd，旧版为 cost_usd
        cost_usd: obj
            .get("total_cost_usd")
            .or_else(|| obj.get("cost_usd"))
            .and_then(Value::as_f64),
        duration_ms: obj.get("duration_ms").and_then(Value::as_u64),
        num_turns: obj.get("num_turns").and_then(Value::as_u64),
        is_error: obj
            .get("is_error")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        result: owned_str_field(obj, "result"),
    }
}

fn parse_summary(obj: &Map<String, Value>) -> SummaryInfo {
    SummaryInfo {
        summary: owned_str_field(obj, "summary").unwrap_or_default(),
        leaf_uuid: owned_str_field(obj, "leafUuid"),
    }
}

fn str_field<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key).and_then(Value::as_str)
}

fn owned_str_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    str_field(obj, key).map(str::to_string)
}
