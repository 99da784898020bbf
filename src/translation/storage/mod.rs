//! 存储模块
//!
//! 提供进程内的翻译结果缓存，不做任何持久化。

pub mod cache;

pub use cache::{spawn_sweeper, CacheConfig, CacheEntry, CacheKey, CacheStats, TranslationCache};
