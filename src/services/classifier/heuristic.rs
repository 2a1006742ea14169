//! # 启发式分类（兜底路径）
//!
//! 仅在调用方拿不到结构信息（工具名 / 内容块类型）时使用，例如只持有一段裸文本。
//! 依次运行检测函数，每个命中带一个置信度档位：
//! - 命中 `High` 立即停止扫描
//! - 否则继续扫描，保留档位最高的命中（档位相同时先命中者优先）
//! - 全部未命中 → GenericText，`Fallback` 档位
//!
//! 结构化路径（`classifier::classify`）永远优先；本路径的结果只是尽力而为。

use serde_json::Value;

use crate::models::classification::{
    ClassificationMetadata, ClassificationResult, ContentCategory,
};
use crate::services::classifier::{detect, is_rich};
use crate::utils::text;

/// 启发式置信度档位
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfidenceTier {
    Fallback,
    Low,
    Medium,
    High,
}

impl ConfidenceTier {
    /// 档位对应的置信度数值，始终小于结构化路径的 1.0
    pub fn score(&self) -> f32 {
        match self {
            Self::High => 0.9,
            Self::Medium => 0.7,
            Self::Low => 0.5,
            Self::Fallback => 0.3,
        }
    }
}

/// 单个检测函数的命中结果
struct Hit {
    category: ContentCategory,
    tier: ConfidenceTier,
    metadata: ClassificationMetadata,
}

type Heuristic = fn(&str) -> Option<Hit>;

/// 检测函数表，按扫描顺序排列
const HEURISTICS: &[Heuristic] = &[
    detect_json,
    detect_error,
    detect_numbered_file,
    detect_command_output,
    detect_source_code,
];

/// 对裸文本做启发式分类
pub fn classify_text(content: &str) -> ClassificationResult {
    let mut best: Option<Hit> = None;

    for heuristic in HEURISTICS {
        let Some(hit) = heuristic(content) else {
            continue;
        };
        if hit.tier == ConfidenceTier::High {
            best = Some(hit);
            break;
        }
        if best.as_ref().is_none_or(|current| hit.tier > current.tier) {
            best = Some(hit);
        }
    }

    let hit = best.unwrap_or(Hit {
        category: ContentCategory::GenericText,
        tier: ConfidenceTier::Fallback,
        metadata: ClassificationMetadata::default(),
    });

    ClassificationResult {
        category: hit.category,
        confidence: hit.tier.score(),
        display_strategy: hit.category.default_strategy(),
        rich: is_rich(content, hit.category),
        metadata: hit.metadata,
    }
}

/// 合法 JSON：带顶层 `error` 字段或 `is_error: true` 的对象视为错误对象
fn detect_json(content: &str) -> Option<Hit> {
    if !detect::is_valid_json(content) {
        return None;
    }
    let value: Value = serde_json::from_str(content.trim()).ok()?;
    let is_error_object = value.get("error").is_some_and(|e| !e.is_null())
        || value.get("is_error").and_then(Value::as_bool) == Some(true);

    Some(if is_error_object {
        Hit {
            category: ContentCategory::ErrorObject,
            tier: ConfidenceTier::High,
            metadata: ClassificationMetadata {
                error_type: Some("json_error".into()),
                ..Default::default()
            },
        }
    } else {
        Hit {
            category: ContentCategory::JsonApiResponse,
            tier: ConfidenceTier::High,
            metadata: ClassificationMetadata::default(),
        }
    })
}

/// 错误模式：`Error:` 开头或 Traceback 为高置信度，其余为中等
fn detect_error(content: &str) -> Option<Hit> {
    let label = detect::match_error_pattern(content)?;
    let tier = match label {
        "error" | "traceback" => ConfidenceTier::High,
        _ => ConfidenceTier::Medium,
    };
    Some(Hit {
        category: ContentCategory::ErrorObject,
        tier,
        metadata: ClassificationMetadata {
            error_type: Some(label.into()),
            ..Default::default()
        },
    })
}

/// 带 `cat -n` 行号前缀的文本几乎必然是文件读取结果
fn detect_numbered_file(content: &str) -> Option<Hit> {
    if !detect::has_line_numbers(content) {
        return None;
    }
    Some(Hit {
        category: ContentCategory::FileContent,
        tier: ConfidenceTier::High,
        metadata: ClassificationMetadata {
            file_type: Some(detect::detect_file_type(content).into()),
            ..Default::default()
        },
    })
}

/// 终端输出特征：ANSI 转义序列、提示符行、`ls -l` 的 total 行、退出码
fn detect_command_output(content: &str) -> Option<Hit> {
    let window = text::head(content, detect::SNIFF_WINDOW);
    if text::contains(window, "\u{1b}[") {
        return Some(command_hit(ConfidenceTier::Medium));
    }
    let first_line = window.lines().next().unwrap_or_default();
    let looks_like_shell = first_line.starts_with("$ ")
        || first_line.starts_with("total ")
        || text::contains(window, "exit code")
        || text::contains(window, "Exit code");
    looks_like_shell.then(|| command_hit(ConfidenceTier::Low))
}

fn command_hit(tier: ConfidenceTier) -> Hit {
    Hit {
        category: ContentCategory::CommandOutput,
        tier,
        metadata: ClassificationMetadata::default(),
    }
}

/// 能识别出具体语言的源代码，视为文件内容
fn detect_source_code(content: &str) -> Option<Hit> {
    let file_type = detect::detect_file_type(content);
    if matches!(file_type, "text" | "json" | "markdown") {
        return None;
    }
    Some(Hit {
        category: ContentCategory::FileContent,
        tier: ConfidenceTier::Medium,
        metadata: ClassificationMetadata {
            file_type: Some(file_type.into()),
            ..Default::default()
        },
    })
}
