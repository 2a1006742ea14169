//! # 查看器设置数据模型
//!
//! 定义 `ViewerSettings`，对应配置目录下的 `claude-code-tree/settings.json`。
//!
//! 分类阈值（5 行 / 200 字符）和工具名表是渲染行为的一部分，
//! 不在设置中暴露，只有缓存容量和采样行数等与性能相关的选项可配置。

use serde::{Deserialize, Serialize};

/// 分类缓存的默认容量
pub const DEFAULT_CACHE_CAPACITY: usize = 512;

/// 查看器设置
///
/// 对应 JSON 文件：
/// ```json
/// {
///   "classificationCacheCapacity": 512,
///   "sampleLines": 2000
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewerSettings {
    /// 分类缓存容量：最多缓存这么多个内容块的分类结果，为 0 时按 1 处理
    pub classification_cache_capacity: usize,

    /// 有界采样：只读取文件的前 N 行；为 `null`（None）时读取整个文件
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample_lines: Option<usize>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            classification_cache_capacity: DEFAULT_CACHE_CAPACITY,
            sample_lines: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_fill_defaults() {
        let settings: ViewerSettings = serde_json::from_str(r#"{ "sampleLines": 10 }"#).unwrap();
        assert_eq!(settings.sample_lines, Some(10));
        assert_eq!(settings.classification_cache_capacity, DEFAULT_CACHE_CAPACITY);
    }
}
