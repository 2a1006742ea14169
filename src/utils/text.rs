//! # 文本工具函数
//!
//! 分类器和会话树构建共用的文本度量与整理函数：
//! - 行数 / 字符数统计（富展示阈值判断）
//! - 换行清理与按字符截断（预览文本）
//! - 稳定指纹（节点 ID 与分类缓存键）

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// 统计文本行数，语义与 `str::lines().count()` 一致
///
/// 使用 `memchr` 的 SIMD 加速计数换行符，分类器会对每个内容块调用此函数。
///
/// # 示例
/// - `""` → 0
/// - `"a"` → 1
/// - `"a\nb\n"` → 2
pub fn count_lines(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    let newlines = memchr::memchr_iter(b'\n', text.as_bytes()).count();
    if text.ends_with('\n') {
        newlines
    } else {
        newlines + 1
    }
}

/// 统计字符数（Unicode 标量值个数，而非字节数）
pub fn char_count(text: &str) -> usize {
    text.chars().count()
}

/// 取前 `max_chars` 个字符，保证切在字符边界上
pub fn head(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// 清理换行：逐行去除首尾空白，丢弃空行，用单个空格连接
pub fn clean_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// 按字符截断，超出时以 `…` 结尾
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if char_count(text) <= max_chars {
        return text.to_string();
    }
    let keep = max_chars.saturating_sub(1);
    format!("{}…", head(text, keep))
}

/// 子串查找（SIMD 加速）
pub fn contains(haystack: &str, needle: &str) -> bool {
    memchr::memmem::find(haystack.as_bytes(), needle.as_bytes()).is_some()
}

/// 计算一组字符串片段的稳定指纹
///
/// `DefaultHasher::new()` 使用固定密钥，同一程序内多次调用结果一致，
/// 满足“同一输入重复构建得到相同节点 ID”的要求。片段之间写入分隔长度，
/// 避免 `["ab", "c"]` 与 `["a", "bc"]` 产生相同指纹。
pub fn fingerprint(parts: &[&str]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for part in parts {
        part.len().hash(&mut hasher);
        part.hash(&mut hasher);
    }
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_lines_matches_std() {
        for text in ["", "a", "a\n", "a\nb", "a\nb\n", "\n\n", "a\r\nb"] {
            assert_eq!(count_lines(text), text.lines().count(), "{:?}", text);
        }
    }

    #[test]
    fn test_head_respects_char_boundaries() {
        assert_eq!(head("你好世界", 2), "你好");
        assert_eq!(head("abc", 10), "abc");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text("  hello\n\n  world  \n"), "hello world");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("short", 10), "short");
        assert_eq!(truncate_chars("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn test_fingerprint_is_stable_and_separated() {
        assert_eq!(fingerprint(&["a", "b"]), fingerprint(&["a", "b"]));
        assert_ne!(fingerprint(&["ab", "c"]), fingerprint(&["a", "bc"]));
    }
}
