//! # 通用工具函数
//!
//! - `path` - 配置文件路径
//! - `text` - 行数统计、文本清理与截断、稳定指纹

pub mod path;
pub mod text;
