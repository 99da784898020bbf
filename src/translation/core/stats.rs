//! 服务运行统计
//!
//! 计数器使用原子操作，同时镜像到 `metrics` 以便接入外部监控。

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::translation::error::{ErrorStats, TranslatorError};

/// 翻译服务统计信息（线程安全版本）
///
/// - `dispatches`: 防抖计时器触发或显式提交产生的调度次数
/// - `cache_hits/misses`: 调度时的缓存查询结果
/// - `stale_discarded`: 已被新输入取代、结果被丢弃的请求数
/// - `processing_time`: 翻译调用累计耗时（微秒）
#[derive(Debug, Default)]
pub struct ServiceStats {
    pub dispatches: AtomicUsize,
    pub cache_hits: AtomicUsize,
    pub cache_misses: AtomicUsize,
    pub translations_completed: AtomicUsize,
    pub stale_discarded: AtomicUsize,
    pub detections: AtomicUsize,
    pub extractions: AtomicUsize,
    pub processing_time: AtomicU64,
    pub total_chars_processed: AtomicUsize,
    pub errors_encountered: AtomicUsize,
    errors: Mutex<ErrorStats>,
}

impl ServiceStats {
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("geasy.dispatches").increment(1);
    }

    pub fn inc_cache_hits(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("geasy.cache_hits").increment(1);
    }

    pub fn inc_cache_misses(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("geasy.cache_misses").increment(1);
    }

    /// 结果已发布到可观察状态
    pub fn inc_translations_completed(&self) {
        self.translations_completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_stale_discarded(&self) {
        self.stale_discarded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("geasy.stale_discarded").increment(1);
    }

    pub fn inc_detections(&self) {
        self.detections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_extractions(&self) {
        self.extractions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_processing_time(&self, duration: Duration) {
        self.processing_time
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn add_chars_processed(&self, count: usize) {
        self.total_chars_processed
            .fetch_add(count, Ordering::Relaxed);
    }

    /// 记录错误，按类别和严重程度汇总
    pub fn record_error(&self, error: &TranslatorError) {
        self.errors_encountered.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("geasy.errors").increment(1);
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .record_error(error);
    }

    pub fn error_stats(&self) -> ErrorStats {
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 获取统计数据快照
    ///
    /// 各字段分别读取，高并发下不保证彼此处于同一时刻。
    pub fn snapshot(&self) -> ServiceStatsSnapshot {
        ServiceStatsSnapshot {
            dispatches: self.dispatches.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            translations_completed: self.translations_completed.load(Ordering::Relaxed),
            stale_discarded: self.stale_discarded.load(Ordering::Relaxed),
            detections: self.detections.load(Ordering::Relaxed),
            extractions: self.extractions.load(Ordering::Relaxed),
            processing_time: Duration::from_micros(self.processing_time.load(Ordering::Relaxed)),
            total_chars_processed: self.total_chars_processed.load(Ordering::Relaxed),
            errors_encountered: self.errors_encountered.load(Ordering::Relaxed),
        }
    }

    /// 重置所有统计计数器
    pub fn reset(&mut self) {
        *self = Default::default();
    }
}

/// 统计数据的不可变快照
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServiceStatsSnapshot {
    pub dispatches: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub translations_completed: usize,
    pub stale_discarded: usize,
    pub detections: usize,
    pub extractions: usize,
    pub processing_time: Duration,
    pub total_chars_processed: usize,
    pub errors_encountered: usize,
}

impl ServiceStatsSnapshot {
    /// 调度时的缓存命中率
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
