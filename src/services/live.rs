//! # 流式会话累加器
//!
//! 外部进程逐行输出 JSONL 时，每到达一行就解析并追加到原始消息列表，
//! 需要展示时对**完整的**累积列表重新合并、重新构建整棵树。
//!
//! 不做增量修补：追加一行后整树重建，分类结果由累加器持有的分类器缓存，
//! 未变化的内容块在重建时直接命中缓存。

use crate::models::message::Message;
use crate::models::tree::{SessionInfo, SessionNode};
use crate::services::classifier::Classifier;
use crate::services::consolidator::consolidate;
use crate::services::parser::{parse_lines, LineError};
use crate::services::tree_builder::build_tree_with;

/// 流式会话累加器
pub struct LiveTranscript {
    /// 未合并的原始消息，按到达顺序
    raw: Vec<Message>,
    errors: Vec<LineError>,
    /// 已接收的行数（含空行和失败行），用于计算行号
    lines_seen: usize,
    classifier: Classifier,
}

impl LiveTranscript {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            raw: Vec::new(),
            errors: Vec::new(),
            lines_seen: 0,
            classifier: Classifier::new(cache_capacity),
        }
    }

    /// 解析并追加一行
    ///
    /// # 返回值
    /// 本行产生的错误（行号为累计行号，从 1 开始）；解析成功时为空切片
    pub fn push_line(&mut self, raw: &str) -> &[LineError] {
        let offset = self.lines_seen;
        self.lines_seen += 1;

        let (messages, errors) = parse_lines([raw]);
        self.raw.extend(messages);

        let first_new = self.errors.len();
        self.errors.extend(errors.into_iter().map(|mut error| {
            error.line += offset;
            error
        }));
        &self.errors[first_new..]
    }

    /// 合并后的完整消息列表
    pub fn messages(&self) -> Vec<Message> {
        consolidate(&self.raw)
    }

    /// 对累积的全部消息重新构建会话树
    pub fn tree(&mut self, session_info: Option<&SessionInfo>) -> SessionNode {
        let messages = consolidate(&self.raw);
        build_tree_with(&mut self.classifier, &messages, session_info)
    }

    pub fn errors(&self) -> &[LineError] {
        &self.errors
    }

    pub fn line_count(&self) -> usize {
        self.lines_seen
    }

    /// 清空累积状态和分类缓存（会话重新开始时调用）
    pub fn reset(&mut self) {
        self.raw.clear();
        self.errors.clear();
        self.lines_seen = 0;
        self.classifier.clear_cache();
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }
}

impl Default for LiveTranscript {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::tree_builder::build_tree;

    const FRAGMENT_TEXT: &str = r#"{"type":"assistant","message":{"id":"a1","role":"assistant","content":[{"type":"text","text":"Checking"}]}}"#;
    const FRAGMENT_TOOL: &str = r#"{"type":"assistant","message":{"id":"a1","role":"assistant","content":[{"type":"tool_use","id":"t1","name":"Bash","input":{"command":"ls"}}]}}"#;
    const RESULT: &str = r#"{"type":"user","message":{"role":"user","content":[{"type":"tool_result","tool_use_id":"t1","content":"Cargo.toml"}]}}"#;

    #[test]
    fn test_rebuild_after_each_line() {
        let mut live = LiveTranscript::new(16);
        assert!(live.push_line(FRAGMENT_TEXT).is_empty());
        assert_eq!(live.tree(None).children.len(), 1);

        live.push_line(FRAGMENT_TOOL);
        let tree = live.tree(None);
        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].children.len(), 1);
        assert!(!tree.children[0].children[0].tool().unwrap().has_result);

        live.push_line(RESULT);
        let tree = live.tree(None);
        assert!(tree.children[0].children[0].tool().unwrap().has_result);
        assert_eq!(live.messages().len(), 2);
    }

    #[test]
    fn test_matches_batch_build() {
        let mut live = LiveTranscript::default();
        for line in [FRAGMENT_TEXT, FRAGMENT_TOOL, RESULT] {
            live.push_line(line);
        }
        let (raw, _) = parse_lines([FRAGMENT_TEXT, FRAGMENT_TOOL, RESULT]);
        assert_eq!(live.tree(None), build_tree(&consolidate(&raw), None));
    }

    #[test]
    fn test_errors_use_running_line_numbers() {
        let mut live = LiveTranscript::new(4);
        live.push_line(FRAGMENT_TEXT);
        live.push_line("");
        let errors = live.push_line("not json");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 3);
        assert_eq!(live.line_count(), 3);

        live.reset();
        assert!(live.errors().is_empty());
        assert!(live.messages().is_empty());
        assert!(live.classifier().cache().is_empty());
    }

    #[test]
    fn test_rebuild_hits_cache() {
        let mut live = LiveTranscript::new(16);
        for line in [FRAGMENT_TOOL, RESULT] {
            live.push_line(line);
        }
        live.tree(None);
        live.tree(None);
        let (hits, _) = live.classifier().cache().stats();
        assert!(hits >= 1);
    }
}
