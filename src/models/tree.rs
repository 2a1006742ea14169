//! # 会话树数据模型
//!
//! 定义渲染层消费的会话树结构，与原始消息列表完全解耦。
//!
//! ## 设计原则
//! - **单向所有权**：消息列表是内容块的唯一所有者，树节点通过 `SourceRef`
//!   （消息下标 + 内容块下标）弱引用来源数据，所有权图中不存在环。
//! - **结构只读**：渲染层只读取 `children`、`display_text` 和分类结果，
//!   唯一允许修改的是 UI 状态标志 `expanded`。
//! - **整树重建**：每次重新加载或流式追加都从头构建整棵树，不做增量修补。
//!
//! ## 数据流
//! ```text
//! JSONL 行 → parser::parse_lines → Vec<Message>
//!         → consolidator::consolidate → 合并后的 Vec<Message>
//!         → tree_builder::build_tree → TreeNode（Session 根节点）
//!         → 渲染层
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::models::classification::ClassificationResult;

/// 会话元数据提示
///
/// 由外部的发现 / 元数据服务预先提取，在数据流中没有 `system/init` 记录时
/// 用来填充 Session 根节点。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// 对来源数据的弱引用：消息在合并后列表中的下标，以及可选的内容块下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceRef {
    pub message_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_index: Option<usize>,
}

impl SourceRef {
    /// 指向整条消息的引用
    pub fn message(message_index: usize) -> Self {
        Self {
            message_index,
            block_index: None,
        }
    }
}

/// 树节点
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// 节点 ID：由稳定的来源标识派生，同一输入重复构建时保持一致
    pub id: String,
    pub display_text: String,
    pub children: Vec<TreeNode>,
    /// UI 持有的展开状态
    pub expanded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
    pub kind: NodeKind,
}

/// Session 根节点；`build_tree` 的返回值
pub type SessionNode = TreeNode;

/// 节点类型及其专属数据
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeKind {
    Session(SessionData),
    Message(MessageData),
    Tool(ToolData),
    Result(ResultData),
    Text,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionData {
    pub session_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_branch: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tool_use_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolData {
    pub tool_use_id: String,
    pub tool_name: String,
    pub tool_input: Value,
    pub has_result: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultData {
    pub tool_use_id: String,
    pub content: String,
    pub is_error: bool,
    pub classification: ClassificationResult,
}

impl TreeNode {
    pub fn is_session(&self) -> bool {
        matches!(self.kind, NodeKind::Session(_))
    }

    /// Session 根节点的专属数据
    pub fn session(&self) -> Option<&SessionData> {
        match &self.kind {
            NodeKind::Session(data) => Some(data),
            _ => None,
        }
    }

    pub fn tool(&self) -> Option<&ToolData> {
        match &self.kind {
            NodeKind::Tool(data) => Some(data),
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ResultData> {
        match &self.kind {
            NodeKind::Result(data) => Some(data),
            _ => None,
        }
    }

    /// 直接子节点中的 Result 节点
    pub fn result_children(&self) -> impl Iterator<Item = &TreeNode> {
        self.children
            .iter()
            .filter(|child| matches!(child.kind, NodeKind::Result(_)))
    }

    /// 深度优先查找指定 ID 的节点
    pub fn find(&self, id: &str) -> Option<&TreeNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// 深度优先遍历（先序），返回 `(深度, 节点)` 列表
    pub fn walk(&self) -> Vec<(usize, &TreeNode)> {
        let mut out = Vec::new();
        let mut stack = vec![(0usize, self)];
        while let Some((depth, node)) = stack.pop() {
            out.push((depth, node));
            for child in node.children.iter().rev() {
                stack.push((depth + 1, child));
            }
        }
        out
    }

    /// 树中节点总数（含自身）
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::node_count).sum::<usize>()
    }
}
