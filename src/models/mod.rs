//! # 数据模型模块
//!
//! 定义了转录处理管线各阶段之间传递的 Rust 数据结构：
//! - `message` - 解析后的消息和内容块
//! - `classification` - 内容分类结果
//! - `tree` - 渲染层消费的会话树
//! - `settings` - 查看器设置

pub mod classification;
pub mod message;
pub mod settings;
pub mod tree;
