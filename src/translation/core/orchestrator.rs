//! 翻译编排器
//!
//! 组合缓存、检测、翻译、文字提取和调度器，对外暴露可观察状态：
//!
//! - **文本路径**: 每次输入同时进入语言检测门控（尽力而为）和调度器（决定译文）
//! - **图片路径**: 选择图片时校验类型，显式提取后把文字当作输入送入文本路径
//! - **交换语言**: 交换语言对，把译文移到原文，清空译文和检测结果后重新进入文本路径

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::scheduler::{RequestScheduler, SchedulerConfig, SchedulerPhase, TranslationJob};
use super::state::{StateHandle, TranslationMode, TranslatorState};
use super::stats::{ServiceStats, ServiceStatsSnapshot};
use crate::translation::config::OrchestratorConfig;
use crate::translation::error::{helpers, ErrorStats, TranslatorError, TranslatorResult};
use crate::translation::providers::{
    with_timeout, DetectionResult, HttpLanguageDetector, ImageInput, LanguageCatalog,
    LanguageDetector, LingvaTranslator, OcrExtractor, OcrSpaceExtractor, TranslationProvider,
};
use crate::translation::storage::{spawn_sweeper, CacheConfig, CacheStats, TranslationCache};

/// 翻译编排器
///
/// 必须在 tokio 运行时内创建：构造时会启动缓存清理任务，drop 时停止。
pub struct Orchestrator {
    inner: Arc<Inner>,
    sweeper: JoinHandle<()>,
}

struct Inner {
    config: OrchestratorConfig,
    cache: Arc<TranslationCache>,
    detector: Arc<dyn LanguageDetector>,
    provider: Arc<dyn TranslationProvider>,
    extractor: Arc<dyn OcrExtractor>,
    scheduler: RequestScheduler,
    state: StateHandle,
    stats: Arc<ServiceStats>,
    /// 最近一次语言检测的编号
    detection_generation: AtomicU64,
    /// 串行化所有会向调度器提交原文的操作
    text_path: Mutex<()>,
    image: Mutex<Option<ImageInput>>,
}

impl Orchestrator {
    pub fn new(
        config: OrchestratorConfig,
        detector: Arc<dyn LanguageDetector>,
        provider: Arc<dyn TranslationProvider>,
        extractor: Arc<dyn OcrExtractor>,
    ) -> TranslatorResult<Self> {
        config.validate()?;

        let cache = Arc::new(TranslationCache::with_config(CacheConfig {
            ttl: config.cache_ttl(),
            max_entries: config.cache_max_entries,
        }));
        let state = StateHandle::new(TranslatorState::new(
            &config.default_source_lang,
            &config.default_target_lang,
        ));
        let stats = Arc::new(ServiceStats::default());
        let scheduler = RequestScheduler::new(
            Arc::clone(&cache),
            Arc::clone(&provider),
            state.clone(),
            Arc::clone(&stats),
            SchedulerConfig {
                debounce: config.debounce(),
                request_timeout: config.request_timeout(),
            },
        );
        let sweeper = spawn_sweeper(Arc::clone(&cache), config.sweep_interval());

        tracing::info!(
            "翻译编排器已启动: {}→{}, 防抖 {:?}, 缓存TTL {:?}",
            config.default_source_lang,
            config.default_target_lang,
            config.debounce(),
            config.cache_ttl()
        );

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                cache,
                detector,
                provider,
                extractor,
                scheduler,
                state,
                stats,
                detection_generation: AtomicU64::new(0),
                text_path: Mutex::new(()),
                image: Mutex::new(None),
            }),
            sweeper,
        })
    }

    /// 使用配置中的 HTTP 服务创建
    pub fn from_config(config: OrchestratorConfig) -> TranslatorResult<Self> {
        let detector = Arc::new(HttpLanguageDetector::from_config(&config)?);
        let provider = Arc::new(LingvaTranslator::from_config(&config)?);
        let extractor = Arc::new(OcrSpaceExtractor::from_config(&config)?);
        Self::new(config, detector, provider, extractor)
    }

    // ========================================================================
    // 文本路径
    // ========================================================================

    /// 输入变化
    pub fn on_text_change(&self, text: &str) {
        let displayed = self.inner.state.snapshot().translated_text;
        self.inner.enter_text_path(text, &displayed);
    }

    /// 立即翻译当前输入，不等待防抖
    pub async fn submit(&self) -> TranslatorResult<String> {
        let dispatch = {
            let _text_path = self.inner.lock_text_path();
            self.inner.scheduler.submit(self.inner.current_job())
        };
        dispatch.await
    }

    pub fn set_source_lang(&self, lang: &str) -> TranslatorResult<()> {
        let lang = non_empty_lang(lang)?;
        self.inner.reschedule(|s| s.source_lang = lang);
        Ok(())
    }

    pub fn set_target_lang(&self, lang: &str) -> TranslatorResult<()> {
        let lang = non_empty_lang(lang)?;
        self.inner.reschedule(|s| s.target_lang = lang);
        Ok(())
    }

    /// 交换语言对，译文成为新的原文
    pub fn swap_languages(&self) {
        let _text_path = self.inner.lock_text_path();
        // 先让进行中的请求失效，避免旧结果在交换后写回
        self.inner.scheduler.cancel();

        let mut displayed = String::new();
        self.inner.state.update(|s| {
            std::mem::swap(&mut s.source_lang, &mut s.target_lang);
            displayed = std::mem::take(&mut s.translated_text);
            s.source_text = displayed.clone();
            s.detected_language = None;
            s.error = None;
        });

        tracing::info!("交换语言对");
        // 门控按交换前显示的译文判断，原文等于旧译文时不再检测
        self.inner.feed_text(&displayed, &displayed);
    }

    // ========================================================================
    // 图片路径
    // ========================================================================

    /// 选择图片，非图片类型立即拒绝
    pub fn select_image(&self, image: ImageInput) -> TranslatorResult<()> {
        if let Err(e) = self.inner.extractor.validate(&image) {
            tracing::warn!("拒绝所选文件: {}", e);
            return Err(self.inner.report(e));
        }

        tracing::debug!("已选择图片: {} 字节", image.bytes.len());
        *self.inner.lock_image() = Some(image);
        self.inner.state.update(|s| {
            s.has_image = true;
            s.mode = TranslationMode::Image;
            s.error = None;
        });
        Ok(())
    }

    pub fn remove_image(&self) {
        self.inner.lock_image().take();
        self.inner.state.update(|s| s.has_image = false);
    }

    pub fn set_mode(&self, mode: TranslationMode) {
        self.inner.state.update(|s| s.mode = mode);
    }

    /// 提取所选图片中的文字，成功后作为输入进入文本路径
    ///
    /// 失败时原文和译文保持不变。
    pub async fn extract_text(&self) -> TranslatorResult<String> {
        let selected = self.inner.lock_image().clone();
        let image = match selected {
            Some(image) => image,
            None => {
                let e = helpers::validation_error("请先选择图片");
                return Err(self.inner.report(e));
            }
        };
        self.inner
            .extractor
            .validate(&image)
            .map_err(|e| self.inner.report(e))?;

        let language_hint = self.inner.state.snapshot().source_lang;
        self.inner.state.update(|s| {
            s.is_extracting = true;
            s.error = None;
        });

        let result = with_timeout(
            self.inner.config.request_timeout(),
            self.inner.extractor.extract(&image, &language_hint),
        )
        .await
        .and_then(|extracted| {
            let text = extracted.text.trim();
            if !extracted.success || text.is_empty() {
                Err(TranslatorError::Extraction(
                    "未能从图片中识别出文字".to_string(),
                ))
            } else {
                Ok(text.to_string())
            }
        });

        match result {
            Ok(text) => {
                self.inner.state.update(|s| s.is_extracting = false);
                self.inner.stats.inc_extractions();
                tracing::info!("已从图片提取 {} 个字符", text.chars().count());
                self.on_text_change(&text);
                Ok(text)
            }
            Err(e) => {
                self.inner.state.update(|s| {
                    s.is_extracting = false;
                    s.error = Some(e.clone());
                });
                self.inner.stats.record_error(&e);
                helpers::log_error(e)
            }
        }
    }

    // ========================================================================
    // 查询
    // ========================================================================

    /// 语言列表，服务不可用时使用内置列表
    pub async fn languages(&self) -> LanguageCatalog {
        let timeout = self.inner.config.request_timeout();
        match tokio::time::timeout(timeout, LanguageCatalog::load(self.inner.provider.as_ref()))
            .await
        {
            Ok(catalog) => catalog,
            Err(_) => {
                tracing::warn!("获取语言列表超时，使用内置列表");
                LanguageCatalog::fallback()
            }
        }
    }

    pub fn state(&self) -> TranslatorState {
        self.inner.state.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<TranslatorState> {
        self.inner.state.subscribe()
    }

    pub fn detected_language(&self) -> Option<DetectionResult> {
        self.inner.state.snapshot().detected_language
    }

    /// 等待所有请求结束并返回最终状态
    pub async fn settled(&self) -> TranslatorState {
        let mut rx = self.inner.state.subscribe();
        loop {
            let state = self.inner.state.snapshot();
            if !state.is_busy() && self.inner.scheduler.phase() == SchedulerPhase::Idle {
                return state;
            }
            if rx.changed().await.is_err() {
                return self.inner.state.snapshot();
            }
        }
    }

    pub fn scheduler(&self) -> &RequestScheduler {
        &self.inner.scheduler
    }

    pub fn cache(&self) -> Arc<TranslationCache> {
        Arc::clone(&self.inner.cache)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.get_stats()
    }

    pub fn stats(&self) -> ServiceStatsSnapshot {
        self.inner.stats.snapshot()
    }

    pub fn error_stats(&self) -> ErrorStats {
        self.inner.stats.error_stats()
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.inner.config
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        self.sweeper.abort();
        self.inner.scheduler.cancel();
    }
}

impl Inner {
    fn lock_image(&self) -> MutexGuard<'_, Option<ImageInput>> {
        self.image.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_text_path(&self) -> MutexGuard<'_, ()> {
        self.text_path.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn current_job(&self) -> TranslationJob {
        let s = self.state.snapshot();
        TranslationJob::new(&s.source_text, &s.source_lang, &s.target_lang)
    }

    /// 记录对用户可见的错误并原样返回
    fn report(&self, error: TranslatorError) -> TranslatorError {
        self.state.update(|s| s.error = Some(error.clone()));
        error
    }

    /// 语言变化只重新调度翻译，不触发检测
    fn reschedule(&self, change: impl FnOnce(&mut TranslatorState)) {
        let _text_path = self.lock_text_path();
        self.state.update(change);
        self.scheduler.on_text_change(self.current_job());
    }

    /// `displayed` 为输入前显示的译文，用于检测门控
    fn enter_text_path(self: &Arc<Self>, text: &str, displayed: &str) {
        let _text_path = self.lock_text_path();
        self.feed_text(text, displayed);
    }

    /// 调用方必须持有 `text_path`
    fn feed_text(self: &Arc<Self>, text: &str, displayed: &str) {
        let snapshot = self.state.snapshot();
        let job = TranslationJob::new(text, &snapshot.source_lang, &snapshot.target_lang);

        // 先推进调度器，旧请求不会再写入新原文对应的译文
        self.scheduler.on_text_change(job);
        self.state.update(|s| s.source_text = text.to_string());

        if self.should_detect(text, displayed) {
            self.spawn_detection(text.to_string());
        }
    }

    fn should_detect(&self, text: &str, displayed: &str) -> bool {
        text.chars().count() > self.config.detection_min_chars && text != displayed
    }

    fn spawn_detection(self: &Arc<Self>, text: String) {
        let generation = self.detection_generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.update(|s| s.is_detecting = true);
        tracing::debug!("开始语言检测 #{}", generation);

        let inner = Arc::clone(self);
        tokio::spawn(async move {
            let result = with_timeout(
                inner.config.request_timeout(),
                inner.detector.detect(&text),
            )
            .await;
            inner.apply_detection(generation, &text, result);
        });
    }

    /// 只接受最新一次检测且原文未变时的结果；检测失败只记录日志
    fn apply_detection(
        &self,
        generation: u64,
        text: &str,
        result: TranslatorResult<DetectionResult>,
    ) {
        let detected = match result {
            Ok(detected) => {
                self.stats.inc_detections();
                detected
            }
            Err(e) => {
                tracing::warn!("语言检测失败，沿用当前源语言: {}", e);
                self.stats.record_error(&e);
                self.state.update_if(|s| {
                    let current = self.detection_generation.load(Ordering::SeqCst) == generation;
                    if current {
                        s.is_detecting = false;
                    }
                    current
                });
                return;
            }
        };

        // 检查原文、改写源语言、重新调度三步之间不能插入新的输入
        let _text_path = self.lock_text_path();
        let mut reschedule = None;
        let mut applied = false;
        self.state.update(|s| {
            if self.detection_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            s.is_detecting = false;
            if s.source_text != text {
                return;
            }

            applied = true;
            if s.source_lang != detected.lang {
                s.source_lang = detected.lang.clone();
                reschedule = Some(TranslationJob::new(
                    &s.source_text,
                    &s.source_lang,
                    &s.target_lang,
                ));
            }
            s.detected_language = Some(detected.clone());
        });

        if !applied {
            tracing::debug!("语言检测 #{} 的结果已过期，丢弃", generation);
            return;
        }

        tracing::info!(
            "检测到语言: {} (置信度 {:?})",
            detected.lang,
            detected.confidence
        );
        if let Some(job) = reschedule {
            self.scheduler.on_text_change(job);
        }
    }
}

fn non_empty_lang(lang: &str) -> TranslatorResult<String> {
    let lang = lang.trim();
    if lang.is_empty() {
        return Err(TranslatorError::Validation("语言代码不能为空".to_string()));
    }
    Ok(lang.to_string())
}
