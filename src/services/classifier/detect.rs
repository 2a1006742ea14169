//! # 内容检测工具
//!
//! 分类器两条路径共用的廉价检测函数：
//! - JSON 校验：括号配对预检 + 真实解码，只有解码成功才算合法 JSON
//! - 错误模式匹配：固定顺序的模式表，先区分大小写匹配，再不区分大小写兜底
//! - 文件类型嗅探：只看前 200 个字符的结构特征
//! - 外部工具服务器（`mcp__server__tool`）命名解析
//!
//! 所有正则均通过 `LazyLock` 预编译，全局唯一。

use std::sync::LazyLock;

use regex::Regex;

use crate::utils::text;

/// 错误模式与文件类型嗅探的扫描窗口（字符数）
pub const SNIFF_WINDOW: usize = 200;

/// 外部工具服务器注册的工具名前缀
pub const MCP_PREFIX: &str = "mcp__";

/// 错误模式的匹配位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    /// 必须出现在文本开头（忽略前导空白）
    Leading,
    /// 出现在扫描窗口内任意位置
    Anywhere,
}

/// 单条错误模式
struct ErrorPattern {
    /// 写入 `metadata.error_type` 的标签
    label: &'static str,
    needle: &'static str,
    anchor: Anchor,
}

/// 有序的错误模式表，先匹配者优先
const ERROR_PATTERNS: &[ErrorPattern] = &[
    ErrorPattern {
        label: "error",
        needle: "Error:",
        anchor: Anchor::Leading,
    },
    ErrorPattern {
        label: "error",
        needle: "error:",
        anchor: Anchor::Leading,
    },
    ErrorPattern {
        label: "exception",
        needle: "Exception",
        anchor: Anchor::Anywhere,
    },
    ErrorPattern {
        label: "traceback",
        needle: "Traceback",
        anchor: Anchor::Anywhere,
    },
    ErrorPattern {
        label: "file_not_found",
        needle: "File not found",
        anchor: Anchor::Anywhere,
    },
    ErrorPattern {
        label: "not_found",
        needle: "not found",
        anchor: Anchor::Anywhere,
    },
    ErrorPattern {
        label: "failed",
        needle: "failed to",
        anchor: Anchor::Anywhere,
    },
];

/// `"is_error": true` 形式的结构化错误标记
static IS_ERROR_MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)"?is_error"?\s*[:=]\s*true"#).unwrap());

/// Read 工具输出的 `cat -n` 风格行号前缀（`     12→` 或 `     12\t`）
static LINE_NUMBER_PREFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^ *\d+(?:→|\t)").unwrap());

/// XML / HTML 起始标签
static XML_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(?:!DOCTYPE\s+\w+|[A-Za-z][\w:.-]*)(?:\s[^>]*)?/?>").unwrap());

/// 语言关键字启发式，按优先级排列，先匹配者胜出
static LANGUAGE_HINTS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("lua", r"(?m)^\s*local\s+\w+|\bfunction\b[\s\S]*\bend\b"),
        (
            "python",
            r"(?m)^\s*(?:def\s+\w+\s*\(|import\s+\w+|from\s+[\w.]+\s+import\s)",
        ),
        (
            "rust",
            r"(?m)^\s*(?:pub(?:\([\w:]+\))?\s+)?(?:fn|use|mod|struct|enum|impl|trait)\s",
        ),
        (
            "javascript",
            r"(?m)^\s*(?:const|let|var|export|import)\s|=>|\brequire\(",
        ),
        ("markdown", r"(?m)^#{1,6}\s"),
    ]
    .into_iter()
    .map(|(lang, pattern)| (lang, Regex::new(pattern).unwrap()))
    .collect()
});

/// 判断文本是否为合法 JSON
///
/// 先去除首尾空白，要求首尾字符是配对的 `{}` 或 `[]`，再做一次真实解码。
/// 解码使用 `IgnoredAny`，不构建 Value 树。
pub fn is_valid_json(content: &str) -> bool {
    let trimmed = content.trim();
    let bracketed = (trimmed.starts_with('{') && trimmed.ends_with('}'))
        || (trimmed.starts_with('[') && trimmed.ends_with(']'));
    bracketed && serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok()
}

/// 匹配错误模式
///
/// 只扫描去除首部空白后的前 `SNIFF_WINDOW` 个字符：
/// 1. 按模式表顺序区分大小写匹配
/// 2. 均未命中时，按同一顺序不区分大小写再匹配一遍
/// 3. 最后检查 `is_error: true` 结构化标记
///
/// # 返回值
/// 命中模式的标签，未命中返回 `None`
pub fn match_error_pattern(content: &str) -> Option<&'static str> {
    let window = text::head(content.trim_start(), SNIFF_WINDOW);
    if window.is_empty() {
        return None;
    }

    for pattern in ERROR_PATTERNS {
        if pattern_matches(window, pattern.needle, pattern.anchor) {
            return Some(pattern.label);
        }
    }

    let lowered = window.to_lowercase();
    for pattern in ERROR_PATTERNS {
        let needle = pattern.needle.to_lowercase();
        if pattern_matches(&lowered, &needle, pattern.anchor) {
            return Some(pattern.label);
        }
    }

    IS_ERROR_MARKER_RE
        .is_match(window)
        .then_some("is_error_marker")
}

fn pattern_matches(window: &str, needle: &str, anchor: Anchor) -> bool {
    match anchor {
        Anchor::Leading => window.starts_with(needle),
        Anchor::Anywhere => text::contains(window, needle),
    }
}

/// 去除 `cat -n` 风格的行号前缀
pub fn strip_line_numbers(content: &str) -> String {
    LINE_NUMBER_PREFIX_RE.replace_all(content, "").into_owned()
}

/// 内容是否带有 `cat -n` 风格的行号前缀（检查第一行）
pub fn has_line_numbers(content: &str) -> bool {
    content
        .lines()
        .next()
        .is_some_and(|first| LINE_NUMBER_PREFIX_RE.is_match(first))
}

/// 推断文件类型
///
/// 检测顺序（先匹配者胜出）：
/// 1. 完整解码成功的 JSON → `json`
/// 2. `<?xml` 或起始标签 → `xml`
/// 3. shebang → 按解释器区分 `python` / `javascript` / `shell`
/// 4. 语言关键字优先级表 → `lua` / `python` / `rust` / `javascript` / `markdown`
/// 5. 默认 → `text`
pub fn detect_file_type(content: &str) -> &'static str {
    let stripped = strip_line_numbers(text::head(content, SNIFF_WINDOW * 2));
    let sniff = text::head(stripped.trim_start(), SNIFF_WINDOW);

    if is_valid_json(content) || is_valid_json(&strip_line_numbers(content)) {
        return "json";
    }

    if sniff.starts_with("<?xml") || XML_TAG_RE.is_match(sniff) {
        return "xml";
    }

    if let Some(shebang) = sniff.strip_prefix("#!") {
        let interpreter = shebang.lines().next().unwrap_or_default();
        return if interpreter.contains("python") {
            "python"
        } else if interpreter.contains("node") {
            "javascript"
        } else {
            "shell"
        };
    }

    LANGUAGE_HINTS
        .iter()
        .find(|(_, re)| re.is_match(sniff))
        .map(|(lang, _)| *lang)
        .unwrap_or("text")
}

/// 是否为外部工具服务器注册的工具（`mcp__server__tool`）
pub fn is_mcp_tool(tool_name: &str) -> bool {
    tool_name.starts_with(MCP_PREFIX)
}

/// 拆分外部工具名为 `(server, tool)`
///
/// # 示例
/// - `"mcp__github__create_issue"` → `Some(("github", "create_issue"))`
/// - `"Read"` → `None`
pub fn split_mcp_tool(tool_name: &str) -> Option<(&str, &str)> {
    let rest = tool_name.strip_prefix(MCP_PREFIX)?;
    let (server, tool) = rest.split_once("__")?;
    (!server.is_empty() && !tool.is_empty()).then_some((server, tool))
}
