//! 翻译缓存模块
//!
//! 按 (源语言, 目标语言, 原文) 缓存翻译结果。条目超过 TTL 后视为不存在：
//! 读取时发现过期会立即删除，另有定时清理任务回收写入后再未读取的条目。
//!
//! 默认不限制条目数量，只依赖 TTL 清理；配置 `max_entries` 后按 LRU 淘汰。

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use lru::LruCache;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::translation::config::constants;

// ============================================================================
// 核心类型
// ============================================================================

/// 缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub source_lang: String,
    pub target_lang: String,
    pub source_text: String,
}

/// 缓存条目
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub translated_text: String,
    pub created_at: Instant,
    pub access_count: u64,
}

/// 缓存配置
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    pub max_entries: Option<usize>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: constants::DEFAULT_CACHE_TTL,
            max_entries: None,
        }
    }
}

/// 缓存统计信息
#[derive(Debug, Default, Clone)]
pub struct CacheStats {
    pub total_requests: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub total_entries: usize,
    /// 读取或清理时因过期删除的条目数
    pub expirations: u64,
    /// 因容量上限被淘汰的条目数
    pub evictions: u64,
    pub sweeps: u64,
}

/// 翻译缓存
///
/// get/put/sweep 共用一把互斥锁，多线程运行时下三者彼此原子。
pub struct TranslationCache {
    inner: Mutex<CacheInner>,
    ttl: Duration,
}

struct CacheInner {
    entries: LruCache<CacheKey, CacheEntry>,
    stats: CacheStats,
}

// ============================================================================
// 实现
// ============================================================================

impl CacheKey {
    pub fn new(source_lang: &str, target_lang: &str, source_text: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            source_text: source_text.to_string(),
        }
    }
}

impl CacheEntry {
    /// 创建新的缓存条目
    pub fn new(translated_text: String) -> Self {
        Self {
            translated_text,
            created_at: Instant::now(),
            access_count: 0,
        }
    }

    /// 检查条目是否过期（年龄恰好等于 TTL 仍然有效）
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

impl TranslationCache {
    /// 创建默认配置的翻译缓存（30分钟TTL，无容量上限）
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    /// 使用指定TTL创建缓存
    pub fn with_ttl(ttl: Duration) -> Self {
        Self::with_config(CacheConfig {
            ttl,
            max_entries: None,
        })
    }

    /// 使用指定配置创建缓存
    pub fn with_config(config: CacheConfig) -> Self {
        let entries = match config.max_entries.and_then(NonZeroUsize::new) {
            Some(cap) => LruCache::new(cap),
            None => LruCache::unbounded(),
        };

        Self {
            inner: Mutex::new(CacheInner {
                entries,
                stats: CacheStats::default(),
            }),
            ttl: config.ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 查询翻译，过期条目会被删除并按未命中处理
    pub fn get(&self, source_lang: &str, target_lang: &str, text: &str) -> Option<String> {
        let key = CacheKey::new(source_lang, target_lang, text);
        let mut guard = self.lock();
        let inner = &mut *guard;
        inner.stats.total_requests += 1;

        let expired = match inner.entries.get_mut(&key) {
            Some(entry) if !entry.is_expired(self.ttl) => {
                entry.access_count += 1;
                let translated = entry.translated_text.clone();
                inner.stats.cache_hits += 1;
                return Some(translated);
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            inner.entries.pop(&key);
            inner.stats.expirations += 1;
            tracing::debug!("缓存条目已过期: {}→{}", source_lang, target_lang);
        }

        inner.stats.cache_misses += 1;
        None
    }

    /// 插入或覆盖翻译，覆盖时重置创建时间
    pub fn put(&self, source_lang: &str, target_lang: &str, text: &str, translation: &str) {
        let key = CacheKey::new(source_lang, target_lang, text);
        let mut guard = self.lock();
        let inner = &mut *guard;

        let replaced_key = key.clone();
        if let Some((evicted, _)) = inner
            .entries
            .push(key, CacheEntry::new(translation.to_string()))
        {
            // push 在覆盖同一个键时也会返回旧值
            if evicted != replaced_key {
                inner.stats.evictions += 1;
            }
        }

        inner.stats.total_entries = inner.entries.len();
    }

    /// 清理所有过期条目，返回删除数量
    pub fn sweep(&self) -> usize {
        let mut guard = self.lock();
        let inner = &mut *guard;

        let expired: Vec<CacheKey> = inner
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            inner.entries.pop(key);
        }

        let removed = expired.len();
        inner.stats.expirations += removed as u64;
        inner.stats.sweeps += 1;
        inner.stats.total_entries = inner.entries.len();

        if removed > 0 {
            tracing::debug!("缓存清理完成，删除 {} 个过期条目", removed);
        }

        removed
    }

    /// 检查是否包含未过期的键（不影响统计和LRU顺序）
    pub fn contains(&self, source_lang: &str, target_lang: &str, text: &str) -> bool {
        let key = CacheKey::new(source_lang, target_lang, text);
        let inner = self.lock();
        inner
            .entries
            .peek(&key)
            .is_some_and(|entry| !entry.is_expired(self.ttl))
    }

    /// 清空缓存
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.stats.total_entries = 0;
    }

    /// 获取缓存大小（包括尚未清理的过期条目）
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 获取统计信息
    pub fn get_stats(&self) -> CacheStats {
        let inner = self.lock();
        let mut result = inner.stats.clone();
        result.total_entries = inner.entries.len();
        result
    }

    /// 重置统计信息
    pub fn reset_stats(&self) {
        self.lock().stats = CacheStats::default();
    }
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::new()
    }
}

/// 启动定时清理任务，与读取路径解耦
///
/// 返回的句柄由调用方持有，`abort()` 即停止清理。
pub fn spawn_sweeper(cache: Arc<TranslationCache>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // 第一次 tick 立即完成
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = cache.sweep();
            tracing::trace!("定时清理: 删除 {} 个条目，剩余 {}", removed, cache.len());
        }
    })
}

impl CacheStats {
    /// 计算缓存命中率
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.cache_hits as f64 / self.total_requests as f64
        }
    }

    /// 计算缓存未命中率
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_cache_round_trip_and_expiry() {
        let cache = TranslationCache::new();

        cache.put("en", "vi", "hello", "xin chào");
        assert_eq!(cache.get("en", "vi", "hello"), Some("xin chào".to_string()));
        assert_eq!(cache.get("vi", "en", "hello"), None);

        tokio::time::advance(Duration::from_secs(30 * 60)).await;
        // 年龄恰好等于 TTL 仍然有效
        assert_eq!(cache.get("en", "vi", "hello"), Some("xin chào".to_string()));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("en", "vi", "hello"), None);
        assert!(cache.is_empty());
        assert_eq!(cache.get_stats().expirations, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_freshness() {
        let cache = TranslationCache::with_ttl(Duration::from_secs(60));

        cache.put("en", "vi", "cat", "con mèo");
        tokio::time::advance(Duration::from_secs(50)).await;
        cache.put("en", "vi", "cat", "mèo");
        tokio::time::advance(Duration::from_secs(50)).await;

        assert_eq!(cache.get("en", "vi", "cat"), Some("mèo".to_string()));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get_stats().evictions, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweep_removes_only_stale_entries() {
        let cache = TranslationCache::with_ttl(Duration::from_secs(10));

        cache.put("en", "vi", "old", "cũ");
        tokio::time::advance(Duration::from_secs(8)).await;
        cache.put("en", "vi", "new", "mới");
        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(cache.sweep(), 1);
        assert!(!cache.contains("en", "vi", "old"));
        assert!(cache.contains("en", "vi", "new"));

        let stats = cache.get_stats();
        assert_eq!(stats.sweeps, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_cache_stats() {
        let cache = TranslationCache::new();
        cache.put("en", "vi", "hello", "xin chào");

        cache.get("en", "vi", "hello");
        cache.get("en", "vi", "world");

        let stats = cache.get_stats();
        assert_eq!(stats.cache_hits, 1);
        assert_eq!(stats.cache_misses, 1);
        assert_eq!(stats.total_requests, 2);
        assert_eq!(stats.hit_rate(), 0.5);

        cache.reset_stats();
        assert_eq!(cache.get_stats().total_requests, 0);
    }

    #[test]
    fn test_bounded_cache_evicts_least_recently_used() {
        let cache = TranslationCache::with_config(CacheConfig {
            ttl: Duration::from_secs(3600),
            max_entries: Some(2),
        });

        cache.put("en", "vi", "1", "một");
        cache.put("en", "vi", "2", "hai");
        cache.get("en", "vi", "1");
        cache.put("en", "vi", "3", "ba");

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("en", "vi", "1"), Some("một".to_string()));
        assert_eq!(cache.get("en", "vi", "2"), None);
        assert_eq!(cache.get_stats().evictions, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sweeper_runs_on_interval() {
        let cache = Arc::new(TranslationCache::with_ttl(Duration::from_secs(60)));
        cache.put("en", "ja", "written once", "一度だけ");

        let handle = spawn_sweeper(Arc::clone(&cache), Duration::from_secs(300));
        tokio::time::sleep(Duration::from_secs(301)).await;

        assert!(cache.is_empty());
        assert!(cache.get_stats().sweeps >= 1);
        handle.abort();
    }
}
