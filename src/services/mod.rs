//! # 转录处理管线
//!
//! 管线各阶段按数据流顺序排列，全部同步、单线程、不做 I/O（`source` 除外）：
//! - `parser` - JSONL 行解析为强类型消息，逐行容错
//! - `consolidator` - 合并同一逻辑 ID 的 assistant 分片
//! - `linker` - 工具调用与工具结果的双向索引
//! - `classifier` - 内容分类（结构化决策表 + 启发式兜底）
//! - `cache` - 分类结果 LRU 缓存
//! - `tree_builder` - 组装会话树
//! - `live` - 流式追加、整树重建的累加器
//! - `source` - 行数据来源（整文件读取 / 有界采样）

pub mod cache;
pub mod classifier;
pub mod consolidator;
pub mod linker;
pub mod live;
pub mod parser;
pub mod source;
pub mod tree_builder;
