//! # 工具调用关联服务
//!
//! 构建 tool_use ID 与消息之间的双向索引，供 Tree Builder 以 O(1) 查找：
//! - `tool_uses`：工具调用 ID → 发出该调用的 assistant 消息
//! - `tool_results`：工具调用 ID → 携带其结果的 user 消息
//!
//! 索引只借用消息列表，不复制消息；每次构建会话树时重新构建。
//! 不校验调用与结果是否一一对应：没有结果的调用（如转录被截断）
//! 和找不到调用的结果都是正常、可表示的状态。

use std::collections::HashMap;

use crate::models::message::{ContentBlock, Message, MessageBody, ToolResultBlock, ToolUseBlock};
use crate::models::tree::SourceRef;

/// 工具调用关联索引
#[derive(Debug, Default)]
pub struct ToolLinkIndex<'a> {
    /// 工具调用 ID → 发出调用的消息
    pub tool_uses: HashMap<&'a str, &'a Message>,
    /// 工具调用 ID → 携带结果的消息
    pub tool_results: HashMap<&'a str, &'a Message>,
    /// 工具调用 ID → 结果块在消息列表中的位置（供树节点弱引用来源）
    result_locations: HashMap<&'a str, SourceRef>,
}

/// 单次线性扫描构建索引
///
/// # 参数
/// - `messages` - 合并后的消息列表
///
/// # 返回值
/// 借用 `messages` 的 `ToolLinkIndex`
pub fn build_index(messages: &[Message]) -> ToolLinkIndex<'_> {
    let mut index = ToolLinkIndex::default();

    for (message_index, msg) in messages.iter().enumerate() {
        match &msg.body {
            MessageBody::Assistant(_) => {
                for tool_use in msg.tool_uses() {
                    index.tool_uses.insert(tool_use.id.as_str(), msg);
                }
            }
            MessageBody::User(conversation) => {
                for (block_index, block) in conversation.content_blocks.iter().enumerate() {
                    let ContentBlock::ToolResult(result) = block else {
                        continue;
                    };
                    let id = result.tool_use_id.as_str();
                    index.tool_results.insert(id, msg);
                    index.result_locations.insert(
                        id,
                        SourceRef {
                            message_index,
                            block_index: Some(block_index),
                        },
                    );
                }
            }
            MessageBody::System(_) | MessageBody::Result(_) | MessageBody::Summary(_) => {}
        }
    }

    index
}

impl<'a> ToolLinkIndex<'a> {
    /// 查找工具调用对应的结果块
    ///
    /// 同一条 user 消息可能携带多个结果块，按 `tool_use_id` 精确匹配。
    pub fn find_result(&self, tool_use_id: &str) -> Option<&'a ToolResultBlock> {
        let msg: &'a Message = self.tool_results.get(tool_use_id).copied()?;
        msg.tool_results()
            .find(|result| result.tool_use_id == tool_use_id)
    }

    /// 查找工具调用块本身（用于取得工具名）
    pub fn find_tool_use(&self, tool_use_id: &str) -> Option<&'a ToolUseBlock> {
        let msg: &'a Message = self.tool_uses.get(tool_use_id).copied()?;
        msg.tool_uses().find(|tool_use| tool_use.id == tool_use_id)
    }

    /// 结果块的位置：`(消息下标, 内容块下标)`
    pub fn result_location(&self, tool_use_id: &str) -> Option<SourceRef> {
        self.result_locations.get(tool_use_id).copied()
    }

    pub fn has_result(&self, tool_use_id: &str) -> bool {
        self.tool_results.contains_key(tool_use_id)
    }

    /// 找不到对应调用的结果 ID（按字典序，便于稳定输出诊断信息）
    pub fn orphan_results(&self) -> Vec<&'a str> {
        let mut orphans: Vec<&'a str> = self
            .tool_results
            .keys()
            .copied()
            .filter(|id| !self.tool_uses.contains_key(id))
            .collect();
        orphans.sort_unstable();
        orphans
    }

    /// 尚未收到结果的调用 ID（按字典序）
    pub fn pending_tool_uses(&self) -> Vec<&'a str> {
        let mut pending: Vec<&'a str> = self
            .tool_uses
            .keys()
            .copied()
            .filter(|id| !self.tool_results.contains_key(id))
            .collect();
        pending.sort_unstable();
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::parser::parse_lines;

    fn messages() -> Vec<Message> {
        let lines = [
            r#"{"type":"assistant","message":{"id":"a1","role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Read","input":{}},{"type":"tool_use","id":"t2","name":"Bash","input":{}}]}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t2","content":"two"},{"type":"tool_result","tool_use_id":"t1","content":"one"}]}}"#,
            r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"ghost","content":"boo"}]}}"#,
            r#"{"type":"assistant","message":{"id":"a2","role":"assistant","content":[{"type":"tool_use","id":"t3","name":"Grep","input":{}}]}}"#,
        ];
        let (messages, errors) = parse_lines(lines);
        assert!(errors.is_empty());
        messages
    }

    #[test]
    fn test_index_links_uses_and_results() {
        let messages = messages();
        let index = build_index(&messages);
        assert_eq!(index.tool_uses.len(), 3);
        assert_eq!(index.tool_results.len(), 3);
        assert_eq!(index.find_result("t1").unwrap().content.to_text(), "one");
        assert_eq!(index.find_result("t2").unwrap().content.to_text(), "two");
        assert_eq!(index.find_tool_use("t2").unwrap().name, "Bash");
        let location = index.result_location("t1").unwrap();
        assert_eq!(location.message_index, 1);
        assert_eq!(location.block_index, Some(1));
    }

    #[test]
    fn test_gaps_are_representable() {
        let messages = messages();
        let index = build_index(&messages);
        assert!(index.find_result("t3").is_none());
        assert!(!index.has_result("t3"));
        assert_eq!(index.orphan_results(), vec!["ghost"]);
        assert_eq!(index.pending_tool_uses(), vec!["t3"]);
    }

    #[test]
    fn test_empty_messages() {
        let index = build_index(&[]);
        assert!(index.tool_uses.is_empty());
        assert!(index.tool_results.is_empty());
    }
}
