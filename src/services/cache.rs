//! # 分类结果缓存
//!
//! 会话树每次重建都会对所有内容块重新分类，缓存按内容指纹记住分类结果，
//! 避免对未变化的内容重复做 JSON 解码和正则匹配。
//!
//! ## 缓存策略
//! - 有界 LRU：容量满时淘汰最久未访问的条目
//! - 显式清空：`clear()` 可随时调用，清空后结果与未缓存时完全一致
//! - 单线程使用：管线是同步单线程的，不加锁，由所有者（`Classifier`）独占
//!
//! 缓存只是优化手段，正确性不依赖于缓存命中。

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::models::classification::ClassificationResult;

/// 缓存键
///
/// 除了内容指纹外还记录内容块类型和内容长度，
/// 指纹碰撞时需要三者同时相同才会误命中。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: u8,
    pub len: usize,
    pub hash: u64,
}

/// 分类结果 LRU 缓存
pub struct ClassificationCache {
    entries: LruCache<CacheKey, ClassificationResult>,
    hits: u64,
    misses: u64,
}

impl ClassificationCache {
    /// 创建指定容量的缓存，容量为 0 时按 1 处理
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// 查询缓存，命中时刷新该条目的访问顺序
    pub fn get(&mut self, key: &CacheKey) -> Option<ClassificationResult> {
        match self.entries.get(key) {
            Some(result) => {
                self.hits += 1;
                Some(result.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// 写入缓存，容量满时淘汰最久未访问的条目
    pub fn put(&mut self, key: CacheKey, result: ClassificationResult) {
        self.entries.put(key, result);
    }

    /// 清空所有条目和命中统计
    pub fn clear(&mut self) {
        log::debug!(
            "清空分类缓存: {} 条, 命中 {} / 未命中 {}",
            self.entries.len(),
            self.hits,
            self.misses
        );
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// `(命中次数, 未命中次数)`
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}

impl Default for ClassificationCache {
    fn default() -> Self {
        Self::new(crate::models::settings::DEFAULT_CACHE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::classification::{
        ClassificationMetadata, ContentCategory, DisplayStrategy,
    };

    fn result(category: ContentCategory) -> ClassificationResult {
        ClassificationResult {
            category,
            confidence: 1.0,
            display_strategy: DisplayStrategy::AdaptiveInlineOrPopup,
            rich: false,
            metadata: ClassificationMetadata::default(),
        }
    }

    fn key(hash: u64) -> CacheKey {
        CacheKey {
            kind: 0,
            len: 1,
            hash,
        }
    }

    #[test]
    fn test_capacity_is_bounded() {
        let mut cache = ClassificationCache::new(2);
        cache.put(key(1), result(ContentCategory::GenericText));
        cache.put(key(2), result(ContentCategory::FileContent));
        // 访问 key(1)，使 key(2) 成为最久未访问的条目
        assert!(cache.get(&key(1)).is_some());
        cache.put(key(3), result(ContentCategory::CommandOutput));
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&key(2)).is_none());
        assert!(cache.get(&key(3)).is_some());
    }

    #[test]
    fn test_clear_resets_entries_and_stats() {
        let mut cache = ClassificationCache::new(4);
        cache.put(key(1), result(ContentCategory::GenericText));
        assert!(cache.get(&key(1)).is_some());
        assert!(cache.get(&key(9)).is_none());
        assert_eq!(cache.stats(), (1, 1));
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (0, 0));
    }

    #[test]
    fn test_zero_capacity_treated_as_one() {
        let cache = ClassificationCache::new(0);
        assert_eq!(cache.capacity(), 1);
    }
}
