//! # 会话树构建器
//!
//! 将合并后的消息列表组装为可折叠的会话树，供渲染层直接消费。
//!
//! ## 构建流程
//! 1. 由 `SessionInfo` 提示（或记录中的会话 ID，或 `"unknown"`）创建 Session 根节点
//! 2. 对完整消息列表构建一次 `ToolLinkIndex`
//! 3. 按顺序遍历消息：
//!    - system/init → 更新根节点的 model / cwd，不创建节点
//!    - result → 根节点下追加一条统计摘要 Text 节点
//!    - summary → 根节点下追加 `Summary:` Text 节点
//!    - user 的文本内容 → 根节点下追加 `User:` Text 节点（纯工具结果的 user 消息不产生节点）
//!    - assistant → Message 节点，其下按出现顺序挂 Tool 节点，
//!      Tool 节点下挂唯一的 Result 节点（携带分类结果）
//! 4. 子 agent 消息（`parent_tool_use_id` 指向已知工具调用）嵌套在对应 Tool 节点下，
//!    位于 Result 节点之前；父调用未知的消息放在根节点下
//!
//! ## 确定性
//! 节点 ID 只由稳定的来源标识（消息 ID、工具调用 ID、内容指纹）和单次构建内
//! 单调递增的计数器派生，不依赖 HashMap 遍历顺序、时间或随机数。
//! 同一输入重复构建得到完全相同的树。

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use crate::models::message::{ContentBlock, Message, MessageBody, ResultInfo, ToolUseBlock};
use crate::models::tree::{
    MessageData, NodeKind, ResultData, SessionData, SessionInfo, SessionNode, SourceRef,
    ToolData, TreeNode,
};
use crate::services::classifier::{detect, Classifier};
use crate::services::linker::{build_index, ToolLinkIndex};
use crate::utils::text;

/// 没有任何会话 ID 来源时使用的占位 ID
pub const UNKNOWN_SESSION_ID: &str = "unknown";

/// 单个内联 Text 子节点的紧凑窗口
const INLINE_SINGLE_LINES: usize = 2;
const INLINE_SINGLE_CHARS: usize = 100;
/// 拆分为多个内联子节点的窗口
const INLINE_SPLIT_LINES: usize = 4;
const INLINE_SPLIT_CHARS: usize = 200;
/// 拆分时最多展示的行数
const INLINE_SPLIT_SHOWN: usize = 2;

/// Tool 节点展示文本中主参数的最大字符数
const TOOL_ARG_MAX_CHARS: usize = 60;

/// 工具主参数的候选字段，按优先级排列
const PRIMARY_ARG_KEYS: &[&str] = &[
    "file_path",
    "command",
    "pattern",
    "path",
    "url",
    "query",
    "description",
];

/// 构建会话树（使用一次性的分类器）
///
/// # 参数
/// - `messages` - 合并后的消息列表
/// - `session_info` - 外部预先提取的会话元数据，可为空
///
/// # 返回值
/// Session 根节点
pub fn build_tree(messages: &[Message], session_info: Option<&SessionInfo>) -> SessionNode {
    let mut classifier = Classifier::default();
    build_tree_with(&mut classifier, messages, session_info)
}

/// 构建会话树，复用调用方持有的分类器（及其缓存）
pub fn build_tree_with(
    classifier: &mut Classifier,
    messages: &[Message],
    session_info: Option<&SessionInfo>,
) -> SessionNode {
    let mut builder = TreeBuilder::new(classifier, messages);
    let mut root = builder.session_root(session_info);

    // ---- 根节点层：按消息顺序处理 ----
    for (index, msg) in messages.iter().enumerate() {
        if builder.nests_under_tool(msg) {
            continue;
        }
        match &msg.body {
            MessageBody::System(info) => {
                if msg.subtype.as_deref() == Some("init") {
                    if let NodeKind::Session(data) = &mut root.kind {
                        if info.model.is_some() {
                            data.model = info.model.clone();
                        }
                        if info.cwd.is_some() {
                            data.cwd = info.cwd.clone();
                        }
                    }
                }
            }
            MessageBody::Result(info) => {
                let node = builder.result_summary_node(index, msg.subtype.as_deref(), info);
                root.children.push(node);
            }
            MessageBody::Summary(info) => {
                let display = format!("Summary: {}", text::clean_text(&info.summary));
                let node = builder.text_node(display, Some(SourceRef::message(index)));
                root.children.push(node);
            }
            MessageBody::User(_) => {
                if let Some(node) = builder.user_prompt_node(index) {
                    root.children.push(node);
                }
            }
            MessageBody::Assistant(_) => {
                if let Some(node) = builder.message_node(index) {
                    root.children.push(node);
                }
            }
        }
    }

    // ---- 兜底：父调用形成环等情况下未被嵌套处理的 assistant 消息放到根节点下 ----
    for index in 0..messages.len() {
        if builder.is_pending_assistant(index) {
            if let Some(node) = builder.message_node(index) {
                root.children.push(node);
            }
        }
    }

    root.display_text = session_display(&root);
    log::debug!(
        "构建会话树完成: {} 条消息, {} 个节点",
        messages.len(),
        root.node_count()
    );
    root
}

/// 单次构建的状态
struct TreeBuilder<'a, 'c> {
    classifier: &'c mut Classifier,
    messages: &'a [Message],
    index: ToolLinkIndex<'a>,
    /// 父工具调用 ID → 嵌套在其下的消息下标（按消息顺序）
    nested: HashMap<&'a str, Vec<usize>>,
    /// 已处理的逻辑消息 ID
    seen_ids: HashSet<&'a str>,
    /// 已处理的消息下标
    done: Vec<bool>,
    /// 合成 Text 节点的计数器
    next_text_id: usize,
}

impl<'a, 'c> TreeBuilder<'a, 'c> {
    fn new(classifier: &'c mut Classifier, messages: &'a [Message]) -> Self {
        let index = build_index(messages);

        let mut nested: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (i, msg) in messages.iter().enumerate() {
            let Some(parent) = msg.parent_tool_use_id.as_deref() else {
                continue;
            };
            let is_nestable = match &msg.body {
                MessageBody::Assistant(_) => true,
                MessageBody::User(_) => has_prose(msg),
                _ => false,
            };
            if is_nestable && index.tool_uses.contains_key(parent) {
                nested.entry(parent).or_default().push(i);
            }
        }

        Self {
            classifier,
            messages,
            index,
            nested,
            seen_ids: HashSet::new(),
            done: vec![false; messages.len()],
            next_text_id: 0,
        }
    }

    /// 该消息是否应嵌套在某个 Tool 节点下，而不是出现在根节点层
    fn nests_under_tool(&self, msg: &Message) -> bool {
        matches!(msg.body, MessageBody::Assistant(_) | MessageBody::User(_))
            && has_prose_or_is_assistant(msg)
            && msg
                .parent_tool_use_id
                .as_deref()
                .is_some_and(|parent| self.nested.contains_key(parent))
    }

    fn is_pending_assistant(&self, index: usize) -> bool {
        !self.done[index] && matches!(self.messages[index].body, MessageBody::Assistant(_))
    }

    /// 标记消息为已处理；同一逻辑 ID 或同一下标第二次出现时返回 false
    fn claim(&mut self, index: usize) -> bool {
        if self.done[index] {
            return false;
        }
        self.done[index] = true;
        let messages = self.messages;
        match messages[index].message_id() {
            Some(id) => self.seen_ids.insert(id),
            None => true,
        }
    }

    fn next_text_id(&mut self) -> String {
        let id = format!("text-{}", self.next_text_id);
        self.next_text_id += 1;
        id
    }

    fn session_root(&self, session_info: Option<&SessionInfo>) -> SessionNode {
        let hint = session_info.cloned().unwrap_or_default();
        let session_id = hint
            .id
            .clone()
            .or_else(|| {
                self.messages
                    .iter()
                    .find_map(|msg| msg.session_id.clone())
            })
            .unwrap_or_else(|| UNKNOWN_SESSION_ID.to_string());

        TreeNode {
            id: format!("session-{}", session_id),
            display_text: String::new(),
            children: Vec::new(),
            expanded: true,
            source: None,
            kind: NodeKind::Session(SessionData {
                session_id,
                model: hint.model,
                cwd: hint.cwd,
                git_branch: hint.git_branch,
                version: hint.version,
            }),
        }
    }

    fn text_node(&mut self, display_text: String, source: Option<SourceRef>) -> TreeNode {
        TreeNode {
            id: self.next_text_id(),
            display_text,
            children: Vec::new(),
            expanded: false,
            source,
            kind: NodeKind::Text,
        }
    }

    /// result 记录的统计摘要：`Result success: $0.0123 · 4.2s · 3 turns`
    fn result_summary_node(
        &mut self,
        index: usize,
        subtype: Option<&str>,
        info: &ResultInfo,
    ) -> TreeNode {
        let mut parts = Vec::new();
        if let Some(cost) = info.cost_usd {
            parts.push(format!("${:.4}", cost));
        }
        if let Some(ms) = info.duration_ms {
            parts.push(format!("{:.1}s", ms as f64 / 1000.0));
        }
        if let Some(turns) = info.num_turns {
            parts.push(format!("{} turns", turns));
        }

        let head = match subtype {
            Some(subtype) => format!("Result {}", subtype),
            None => "Result".to_string(),
        };
        let display = if parts.is_empty() {
            head
        } else {
            format!("{}: {}", head, parts.join(" · "))
        };
        self.text_node(display, Some(SourceRef::message(index)))
    }

    /// user 消息中的文本内容；只携带工具结果的 user 消息返回 None
    fn user_prompt_node(&mut self, index: usize) -> Option<TreeNode> {
        let messages = self.messages;
        let msg = messages.get(index)?;
        let preview = msg.first_text().map(text::clean_text)?;
        if preview.is_empty() || !self.claim(index) {
            return None;
        }
        Some(self.text_node(
            format!("User: {}", preview),
            Some(SourceRef::message(index)),
        ))
    }

    /// assistant 消息节点；已处理过的消息（同一逻辑 ID 重复出现）返回 None
    fn message_node(&mut self, index: usize) -> Option<TreeNode> {
        if !self.claim(index) {
            return None;
        }
        let messages = self.messages;
        let msg = &messages[index];

        let mut node = TreeNode {
            id: message_node_id(msg, index),
            display_text: message_preview(msg),
            children: Vec::new(),
            expanded: false,
            source: Some(SourceRef::message(index)),
            kind: NodeKind::Message(MessageData {
                message_id: msg.message_id().map(str::to_string),
                parent_tool_use_id: msg.parent_tool_use_id.clone(),
            }),
        };

        for (block_index, block) in msg.content_blocks().iter().enumerate() {
            if let ContentBlock::ToolUse(tool_use) = block {
                let tool = self.tool_node(index, block_index, tool_use);
                node.children.push(tool);
            }
        }

        Some(node)
    }

    fn tool_node(&mut self, message_index: usize, block_index: usize, tool_use: &ToolUseBlock) -> TreeNode {
        let mut node = TreeNode {
            id: format!("tool-{}", tool_use.id),
            display_text: tool_display(&tool_use.name, &tool_use.input),
            children: Vec::new(),
            expanded: false,
            source: Some(SourceRef {
                message_index,
                block_index: Some(block_index),
            }),
            kind: NodeKind::Tool(ToolData {
                tool_use_id: tool_use.id.clone(),
                tool_name: tool_use.name.clone(),
                tool_input: tool_use.input.clone(),
                has_result: false,
            }),
        };

        // 子 agent 消息排在 Result 之前
        let nested = self.nested.get(tool_use.id.as_str()).cloned().unwrap_or_default();
        for child_index in nested {
            let is_assistant = matches!(self.messages[child_index].body, MessageBody::Assistant(_));
            let child = if is_assistant {
                self.message_node(child_index)
            } else {
                self.user_prompt_node(child_index)
            };
            if let Some(child) = child {
                node.children.push(child);
            }
        }

        if let Some(result) = self.result_node(tool_use) {
            attach_result(&mut node, result);
        }

        node
    }

    fn result_node(&mut self, tool_use: &ToolUseBlock) -> Option<TreeNode> {
        let source = self.index.result_location(&tool_use.id)?;
        let messages = self.messages;
        let block = messages
            .get(source.message_index)?
            .content_blocks()
            .get(source.block_index?)?;
        let ContentBlock::ToolResult(result) = block else {
            return None;
        };

        let classification = self.classifier.classify(block, Some(&tool_use.name));
        let content = result.content.to_text();

        // 富展示内容不生成内联子节点，交给渲染层弹窗展示
        let mut children = Vec::new();
        if !classification.rich {
            for line in inline_lines(&content) {
                let child = self.text_node(line, Some(source));
                children.push(child);
            }
        }

        Some(TreeNode {
            id: format!("result-{}", tool_use.id),
            display_text: result_display(&content, classification.category.label(), result.is_error),
            children,
            expanded: false,
            source: Some(source),
            kind: NodeKind::Result(ResultData {
                tool_use_id: result.tool_use_id.clone(),
                content,
                is_error: result.is_error,
                classification,
            }),
        })
    }
}

/// 挂载 Result 子节点
///
/// 一个 Tool 节点至多有一个 Result 子节点；出现第二个说明关联逻辑有缺陷，直接 panic。
fn attach_result(tool: &mut TreeNode, result: TreeNode) {
    assert!(
        tool.result_children().next().is_none(),
        "tool node {} already has a result child",
        tool.id
    );
    if let NodeKind::Tool(data) = &mut tool.kind {
        data.has_result = true;
    }
    tool.children.push(result);
}

fn has_prose(msg: &Message) -> bool {
    msg.first_text().is_some_and(|t| !t.trim().is_empty())
}

fn has_prose_or_is_assistant(msg: &Message) -> bool {
    matches!(msg.body, MessageBody::Assistant(_)) || has_prose(msg)
}

/// Message 节点 ID：优先使用逻辑消息 ID，否则使用 uuid 或内容指纹
fn message_node_id(msg: &Message, index: usize) -> String {
    if let Some(id) = msg.message_id() {
        return format!("message-{}", id);
    }
    let hash = match msg.uuid.as_deref() {
        Some(uuid) => text::fingerprint(&[uuid]),
        None => {
            let position = index.to_string();
            text::fingerprint(&[position.as_str(), msg.first_text().unwrap_or_default()])
        }
    };
    format!("message-{:016x}", hash)
}

/// Message 节点预览文本
///
/// - 有文本块：第一个文本块清理换行后的内容
/// - 只有工具调用：`Used N tools: Read, Bash`
/// - 否则为空
fn message_preview(msg: &Message) -> String {
    if let Some(first) = msg.first_text() {
        return text::clean_text(first);
    }
    let names: Vec<&str> = msg.tool_uses().map(|t| t.name.as_str()).collect();
    if names.is_empty() {
        return String::new();
    }
    format!("Used {} tools: {}", names.len(), names.join(", "))
}

/// Tool 节点展示文本：`Read: src/main.rs`，外部工具显示为 `server/tool`
fn tool_display(name: &str, input: &Value) -> String {
    let label = match detect::split_mcp_tool(name) {
        Some((server, tool)) => format!("{}/{}", server, tool),
        None => name.to_string(),
    };
    let arg = PRIMARY_ARG_KEYS
        .iter()
        .find_map(|key| input.get(*key).and_then(Value::as_str))
        .map(text::clean_text)
        .filter(|arg| !arg.is_empty());
    match arg {
        Some(arg) => format!("{}: {}", label, text::truncate_chars(&arg, TOOL_ARG_MAX_CHARS)),
        None => label,
    }
}

fn result_display(content: &str, label: &str, is_error: bool) -> String {
    let lines = text::count_lines(content);
    let kind = if is_error { "error" } else { label };
    match lines {
        0 => format!("Result ({}, empty)", kind),
        1 => format!("Result ({})", kind),
        n => format!("Result ({}, {} lines)", kind, n),
    }
}

/// 非富展示内容的内联行
///
/// - ≤ 2 行且 ≤ 100 字符：一个子节点，内容为清理后的全文
/// - ≤ 4 行且 ≤ 200 字符：至多 2 行，剩余行数用 `… N more lines` 标记
/// - 其他或空内容：不生成子节点
fn inline_lines(content: &str) -> Vec<String> {
    let lines = text::count_lines(content);
    let chars = text::char_count(content);
    let cleaned = text::clean_text(content);
    if cleaned.is_empty() {
        return Vec::new();
    }

    if lines <= INLINE_SINGLE_LINES && chars <= INLINE_SINGLE_CHARS {
        return vec![cleaned];
    }

    if lines <= INLINE_SPLIT_LINES && chars <= INLINE_SPLIT_CHARS {
        let mut out: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(INLINE_SPLIT_SHOWN)
            .map(str::to_string)
            .collect();
        let remaining = lines.saturating_sub(INLINE_SPLIT_SHOWN);
        if remaining > 0 {
            out.push(format!("… {} more lines", remaining));
        }
        return out;
    }

    Vec::new()
}

fn session_display(root: &TreeNode) -> String {
    let Some(data) = root.session() else {
        return String::new();
    };
    match &data.model {
        Some(model) => format!("Session {} ({})", data.session_id, model),
        None => format!("Session {}", data.session_id),
    }
}
