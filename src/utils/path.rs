//! # 路径工具函数
//!
//! 定位查看器自身的配置文件：`<config_dir>/claude-code-tree/settings.json`。
//! 配置目录由 `dirs` crate 按平台约定提供：
//! - Linux: `~/.config`
//! - macOS: `~/Library/Application Support`
//! - Windows: `C:\Users\username\AppData\Roaming`

use std::path::{Path, PathBuf};

/// 配置子目录名
pub const APP_DIR_NAME: &str = "claude-code-tree";

/// 设置文件名
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// 获取查看器配置目录的绝对路径
///
/// # 错误
/// 无法确定平台配置目录时（极端情况，如无 HOME 环境变量）返回错误信息
pub fn get_config_dir() -> Result<PathBuf, String> {
    let base = dirs::config_dir().ok_or_else(|| "无法获取系统配置目录".to_string())?;
    Ok(base.join(APP_DIR_NAME))
}

/// 获取默认设置文件路径
pub fn get_settings_path() -> Result<PathBuf, String> {
    Ok(get_config_dir()?.join(SETTINGS_FILE_NAME))
}

/// 解析设置文件路径：显式指定的路径优先，否则使用默认位置
pub fn resolve_settings_path(explicit: Option<&Path>) -> Result<PathBuf, String> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => get_settings_path(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let explicit = Path::new("/tmp/custom.json");
        assert_eq!(resolve_settings_path(Some(explicit)).unwrap(), explicit);
    }

    #[test]
    fn test_default_path_layout() {
        // CI 环境中可能没有配置目录，此时跳过
        let Ok(path) = get_settings_path() else {
            return;
        };
        assert!(path.ends_with(Path::new(APP_DIR_NAME).join(SETTINGS_FILE_NAME)));
    }
}
