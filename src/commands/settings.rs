//! # 设置命令
//!
//! 加载查看器设置 `settings.json` 并与命令行参数合并：
//! - 文件不存在：使用默认设置（首次运行时的正常情况）
//! - 文件存在但 JSON 非法：返回错误，不静默回退
//! - 命令行参数（`--cache-capacity`、`--sample`）覆盖文件中的值

use std::io;
use std::path::Path;

use anyhow::{Context, Result};

use crate::models::settings::ViewerSettings;

/// 读取设置文件
///
/// # 参数
/// - `settings_path` - settings.json 的路径
///
/// # 返回值
/// 解析后的设置；文件不存在时返回默认设置，缺失的字段同样取默认值
///
/// # 错误
/// 文件存在但无法读取或 JSON 解析失败时返回错误
pub async fn load_settings(settings_path: &Path) -> Result<ViewerSettings> {
    let content = match tokio::fs::read_to_string(settings_path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::debug!("设置文件不存在，使用默认设置: {}", settings_path.display());
            return Ok(ViewerSettings::default());
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("读取设置文件失败: {}", settings_path.display()));
        }
    };

    serde_json::from_str(&content)
        .with_context(|| format!("解析设置文件失败: {}", settings_path.display()))
}

/// 用命令行参数覆盖设置
pub fn apply_overrides(
    mut settings: ViewerSettings,
    cache_capacity: Option<usize>,
    sample_lines: Option<usize>,
) -> ViewerSettings {
    if let Some(capacity) = cache_capacity {
        settings.classification_cache_capacity = capacity;
    }
    if sample_lines.is_some() {
        settings.sample_lines = sample_lines;
    }
    settings
}

/// 输出生效中的设置（带 2 空格缩进的 JSON）
pub fn show_settings(settings_path: &Path, settings: &ViewerSettings) -> Result<()> {
    let json = serde_json::to_string_pretty(settings).context("序列化设置失败")?;
    println!("# {}", settings_path.display());
    println!("{}", json);
    Ok(())
}
