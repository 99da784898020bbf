//! 请求调度器
//!
//! 状态机 `Idle → Pending → InFlight → Idle`：
//!
//! - 文本变化时取消旧的防抖计时器并重新计时，空文本直接清空译文
//! - 计时器触发后分配递增序号，先查缓存，未命中再调用翻译服务
//! - 请求返回时如果期间出现过新的输入，结果被丢弃（只做逻辑取消，网络请求本身不中断）
//!
//! 每次输入都会推进 `generation`。计时器回调和请求结果都带着自己的 generation，
//! 与当前值不一致即视为过期。

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use super::state::StateHandle;
use super::stats::ServiceStats;
use crate::translation::error::{TranslatorError, TranslatorResult};
use crate::translation::providers::{with_timeout, TranslationProvider};
use crate::translation::storage::TranslationCache;

// ============================================================================
// 核心类型
// ============================================================================

/// 调度器阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerPhase {
    #[default]
    Idle,
    /// 防抖计时中
    Pending,
    /// 最新的请求已发出，尚未返回
    InFlight,
}

/// 一次翻译任务的输入
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationJob {
    pub source_text: String,
    pub source_lang: String,
    pub target_lang: String,
}

impl TranslationJob {
    pub fn new(source_text: &str, source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_text: source_text.to_string(),
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.source_text.trim().is_empty()
    }
}

/// 请求状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Pending,
    InFlight,
    Completed,
    Superseded,
}

/// 已调度的请求
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedRequest {
    pub sequence: u64,
    pub generation: u64,
    pub job: TranslationJob,
    pub status: RequestStatus,
}

/// 调度参数
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    pub debounce: Duration,
    pub request_timeout: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        use crate::translation::config::constants;
        Self {
            debounce: constants::DEFAULT_DEBOUNCE,
            request_timeout: constants::DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// 请求调度器，克隆后共享同一个状态机
#[derive(Clone)]
pub struct RequestScheduler {
    shared: Arc<Shared>,
}

struct Shared {
    cache: Arc<TranslationCache>,
    provider: Arc<dyn TranslationProvider>,
    state: StateHandle,
    stats: Arc<ServiceStats>,
    config: SchedulerConfig,
    control: Mutex<Control>,
}

#[derive(Default)]
struct Control {
    phase: SchedulerPhase,
    generation: u64,
    next_sequence: u64,
    timer: Option<JoinHandle<()>>,
    /// 最近一次调度的请求
    latest: Option<DispatchedRequest>,
}

// ============================================================================
// 实现
// ============================================================================

impl RequestScheduler {
    pub fn new(
        cache: Arc<TranslationCache>,
        provider: Arc<dyn TranslationProvider>,
        state: StateHandle,
        stats: Arc<ServiceStats>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                cache,
                provider,
                state,
                stats,
                config,
                control: Mutex::new(Control::default()),
            }),
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.shared.lock().phase
    }

    /// 最近一次调度的请求
    pub fn latest_request(&self) -> Option<DispatchedRequest> {
        self.shared.lock().latest.clone()
    }

    pub fn config(&self) -> SchedulerConfig {
        self.shared.config
    }

    /// 输入变化：取代旧请求，重新开始防抖
    pub fn on_text_change(&self, job: TranslationJob) {
        let mut control = self.shared.lock();
        let generation = control.supersede();

        if job.is_blank() {
            control.phase = SchedulerPhase::Idle;
            self.shared.state.update(|s| {
                s.translated_text.clear();
                s.is_translating = false;
                s.error = None;
            });
            tracing::debug!("输入为空，清空译文");
            return;
        }

        control.phase = SchedulerPhase::Pending;
        let shared = Arc::clone(&self.shared);
        let debounce = self.shared.config.debounce;
        control.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            // 结果由状态发布，这里不需要返回值
            let _ = shared.fire(generation, job).await;
        }));
        tracing::debug!("防抖计时开始 (generation {})", generation);
    }

    /// 立即调度，不经过防抖
    ///
    /// 取代旧请求在调用时同步完成，返回的 future 只负责执行。
    pub fn submit(
        &self,
        job: TranslationJob,
    ) -> impl Future<Output = TranslatorResult<String>> + Send + 'static {
        let prepared = self.prepare_submit(&job);
        let shared = Arc::clone(&self.shared);
        async move { shared.fire(prepared?, job).await }
    }

    fn prepare_submit(&self, job: &TranslationJob) -> TranslatorResult<u64> {
        let mut control = self.shared.lock();
        let generation = control.supersede();

        if job.is_blank() {
            control.phase = SchedulerPhase::Idle;
            self.shared.state.update(|s| {
                s.translated_text.clear();
                s.is_translating = false;
            });
            return Err(TranslatorError::Validation("没有需要翻译的文本".to_string()));
        }

        Ok(generation)
    }

    /// 取消防抖计时并使进行中的请求失效
    pub fn cancel(&self) {
        let mut control = self.shared.lock();
        control.supersede();
        control.phase = SchedulerPhase::Idle;
        self.shared.state.update(|s| s.is_translating = false);
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 计时器触发或显式提交：分配序号并执行
    async fn fire(&self, generation: u64, job: TranslationJob) -> TranslatorResult<String> {
        let sequence = {
            let mut control = self.lock();
            if control.generation != generation {
                tracing::trace!("忽略过期的计时器 (generation {})", generation);
                return Err(TranslatorError::StaleResultDiscarded(0));
            }

            // 计时器任务从这里起承载请求，不能再被 abort
            control.timer = None;
            control.next_sequence += 1;
            let sequence = control.next_sequence;
            control.phase = SchedulerPhase::InFlight;
            control.latest = Some(DispatchedRequest {
                sequence,
                generation,
                job: job.clone(),
                status: RequestStatus::InFlight,
            });
            self.state.update(|s| {
                s.is_translating = true;
                s.error = None;
            });
            sequence
        };

        self.stats.inc_dispatches();
        tracing::info!(
            "调度翻译请求 #{}: {}→{} ({} 字符)",
            sequence,
            job.source_lang,
            job.target_lang,
            job.source_text.chars().count()
        );

        let result = self.execute(&job).await;
        self.complete(sequence, generation, result)
    }

    /// 缓存优先，未命中时调用翻译服务并写回缓存
    async fn execute(&self, job: &TranslationJob) -> TranslatorResult<String> {
        if let Some(cached) = self
            .cache
            .get(&job.source_lang, &job.target_lang, &job.source_text)
        {
            self.stats.inc_cache_hits();
            tracing::debug!("缓存命中: {}→{}", job.source_lang, job.target_lang);
            return Ok(cached);
        }
        self.stats.inc_cache_misses();

        let started = Instant::now();
        let result = with_timeout(
            self.config.request_timeout,
            self.provider
                .translate(&job.source_lang, &job.target_lang, &job.source_text),
        )
        .await;
        self.stats.add_processing_time(started.elapsed());

        if let Ok(translated) = &result {
            // 过期请求的结果依然对应自己的键，照样写入缓存
            self.cache.put(
                &job.source_lang,
                &job.target_lang,
                &job.source_text,
                translated,
            );
            self.stats.add_chars_processed(job.source_text.chars().count());
        }

        result
    }

    /// 只有最新一代的结果能写入可观察状态
    fn complete(
        &self,
        sequence: u64,
        generation: u64,
        result: TranslatorResult<String>,
    ) -> TranslatorResult<String> {
        let mut control = self.lock();

        if control.generation != generation {
            drop(control);
            self.stats.inc_stale_discarded();
            tracing::warn!("请求 #{} 已被新输入取代，丢弃结果", sequence);
            return Err(TranslatorError::StaleResultDiscarded(sequence));
        }

        control.phase = SchedulerPhase::Idle;
        if let Some(latest) = control.latest.as_mut() {
            latest.status = RequestStatus::Completed;
        }

        // 持锁发布，保证与下一次输入之间没有交错
        match &result {
            Ok(translated) => {
                self.state.update(|s| {
                    s.translated_text = translated.clone();
                    s.is_translating = false;
                    s.error = None;
                });
                self.stats.inc_translations_completed();
                tracing::info!("请求 #{} 完成", sequence);
            }
            Err(e) => {
                self.state.update(|s| {
                    s.translated_text.clear();
                    s.is_translating = false;
                    s.error = Some(e.clone());
                });
                self.stats.record_error(e);
                tracing::error!("请求 #{} 失败: {}", sequence, e);
            }
        }

        result
    }
}

impl Control {
    /// 推进 generation：取消计时器，标记进行中的请求为已取代
    fn supersede(&mut self) -> u64 {
        self.generation += 1;

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }

        if let Some(latest) = self.latest.as_mut() {
            if matches!(latest.status, RequestStatus::Pending | RequestStatus::InFlight) {
                latest.status = RequestStatus::Superseded;
            }
        }

        self.generation
    }
}
