//! # 消息合并服务
//!
//! Claude Code 以每个增量内容块一条记录的方式流式输出 assistant 回合，
//! 同一回合的多条记录共享相同的 `message.id`。本模块将它们合并为一条逻辑消息，
//! 内容块按到达顺序拼接。
//!
//! ## 合并规则
//! - 首次出现的 `message_id`：深拷贝该记录，在其首次出现的位置输出
//! - 之后出现的同一 `message_id`：把内容块追加到已输出的消息上，不新增条目、不改变位置
//! - 没有 `message_id` 的 assistant 消息以及所有非 assistant 消息：原样按序透传
//!
//! 对已合并的列表再次合并是空操作（合并后不存在重复的 `message_id`）。

use std::collections::HashMap;

use crate::models::message::{Message, MessageBody};

/// 合并共享 `message_id` 的 assistant 记录
///
/// # 参数
/// - `raw_messages` - 解析得到的原始消息列表（不会被修改）
///
/// # 返回值
/// 合并后的消息列表，保持首次出现顺序以及非 assistant 消息的相对顺序
pub fn consolidate(raw_messages: &[Message]) -> Vec<Message> {
    let mut out: Vec<Message> = Vec::with_capacity(raw_messages.len());
    // message_id → 在 out 中的位置
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for msg in raw_messages {
        let Some(message_id) = msg.message_id() else {
            out.push(msg.clone());
            continue;
        };

        match positions.get(message_id) {
            Some(&index) => {
                append_blocks(&mut out[index], msg);
            }
            None => {
                positions.insert(message_id, out.len());
                out.push(msg.clone());
            }
        }
    }

    if out.len() < raw_messages.len() {
        log::debug!(
            "合并消息: {} 条记录 → {} 条消息",
            raw_messages.len(),
            out.len()
        );
    }

    out
}

/// 把 `fragment` 的内容块追加到 `target` 上
fn append_blocks(target: &mut Message, fragment: &Message) {
    let (MessageBody::Assistant(target_conv), MessageBody::Assistant(fragment_conv)) =
        (&mut target.body, &fragment.body)
    else {
        return;
    };
    target_conv
        .content_blocks
        .extend(fragment_conv.content_blocks.iter().cloned());
    // 流式记录的首条可能缺少 model，后续记录补齐
    if target_conv.model.is_none() {
        target_conv.model.clone_from(&fragment_conv.model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{
        ContentBlock, Conversation, MessageKind, SummaryInfo, ToolUseBlock,
    };
    use serde_json::json;

    fn assistant(id: Option<&str>, blocks: Vec<ContentBlock>) -> Message {
        Message {
            subtype: None,
            session_id: None,
            parent_tool_use_id: None,
            uuid: None,
            body: MessageBody::Assistant(Conversation {
                message_id: id.map(str::to_string),
                model: None,
                content_blocks: blocks,
            }),
        }
    }

    fn text(s: &str) -> ContentBlock {
        ContentBlock::Text { text: s.into() }
    }

    fn summary(s: &str) -> Message {
        Message {
            subtype: None,
            session_id: None,
            parent_tool_use_id: None,
            uuid: None,
            body: MessageBody::Summary(SummaryInfo {
                summary: s.into(),
                leaf_uuid: None,
            }),
        }
    }

    #[test]
    fn test_fragments_merge_in_arrival_order() {
        let tool = ContentBlock::ToolUse(ToolUseBlock {
            id: "t1".into(),
            name: "Read".into(),
            input: json!({}),
        });
        let raw = vec![
            assistant(Some("a1"), vec![text("first")]),
            assistant(Some("a1"), vec![tool.clone()]),
        ];
        let merged = consolidate(&raw);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].content_blocks(), &[text("first"), tool]);
        // 输入未被修改
        assert_eq!(raw[0].content_blocks().len(), 1);
    }

    #[test]
    fn test_order_preserved_with_interleaved_messages() {
        let raw = vec![
            assistant(Some("a1"), vec![text("1")]),
            summary("s"),
            assistant(Some("a2"), vec![text("2")]),
            assistant(Some("a1"), vec![text("1b")]),
            assistant(None, vec![text("solo")]),
            assistant(None, vec![text("solo")]),
        ];
        let merged = consolidate(&raw);
        let kinds: Vec<_> = merged.iter().map(|m| m.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                MessageKind::Assistant,
                MessageKind::Summary,
                MessageKind::Assistant,
                MessageKind::Assistant,
                MessageKind::Assistant,
            ]
        );
        assert_eq!(merged[0].content_blocks(), &[text("1"), text("1b")]);
        assert_eq!(merged[2].message_id(), Some("a2"));
        // 没有 message_id 的 assistant 消息不会相互合并
        assert_eq!(merged[3].content_blocks(), &[text("solo")]);
        assert_eq!(merged[4].content_blocks(), &[text("solo")]);
    }

    #[test]
    fn test_consolidation_is_idempotent() {
        let raw = vec![
            assistant(Some("a1"), vec![text("1")]),
            assistant(Some("a2"), vec![text("2")]),
            assistant(Some("a1"), vec![text("3")]),
            summary("s"),
        ];
        let once = consolidate(&raw);
        let twice = consolidate(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_input() {
        assert!(consolidate(&[]).is_empty());
    }
}
