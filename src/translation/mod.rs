//! 翻译模块
//!
//! 在用户输入（文本或图片）与外部翻译、语言检测、文字识别服务之间做调度：
//! - **core**: 调度器、编排器和可观察状态
//! - **providers**: 外部服务接口及其 HTTP 实现
//! - **storage**: 带 TTL 的翻译缓存
//! - **config**: 配置管理
//! - **error**: 错误处理
//!
//! # 基本用法
//!
//! ```rust,no_run
//! use geasy_translate::translation::{ConfigManager, Orchestrator};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigManager::new()?.into_config();
//! let orchestrator = Orchestrator::from_config(config)?;
//!
//! orchestrator.on_text_change("Hello world");
//! let state = orchestrator.settled().await;
//! println!("{} → {}", state.source_text, state.translated_text);
//! # Ok(())
//! # }
//! ```

// ============================================================================
// 子模块声明
// ============================================================================

/// 配置管理模块 - 服务地址、语言、防抖和缓存参数
pub mod config;

/// 核心模块 - 调度器、编排器、状态和统计
pub mod core;

/// 错误处理模块 - 统一的错误类型和处理机制
pub mod error;

/// 外部服务模块 - 翻译、语言检测、文字提取
pub mod providers;

/// 存储模块 - 翻译结果缓存
pub mod storage;

// ============================================================================
// 核心API导出
// ============================================================================

pub use core::{
    Orchestrator, RequestScheduler, SchedulerPhase, ServiceStats, ServiceStatsSnapshot,
    TranslationJob, TranslationMode, TranslatorState,
};

pub use config::{constants, ConfigManager, OrchestratorConfig};

pub use error::{ErrorCategory, ErrorSeverity, TranslatorError, TranslatorResult};

pub use providers::{
    DetectionResult, ExtractionResult, ImageInput, Language, LanguageCatalog, LanguageDetector,
    OcrExtractor, TranslationProvider,
};

pub use storage::{CacheConfig, CacheStats, TranslationCache};

// ============================================================================
// 便利函数
// ============================================================================

/// 使用默认配置翻译一段文本，不经过防抖
///
/// # Examples
///
/// ```rust,no_run
/// use geasy_translate::translation::translate_text;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let translated = translate_text("Hello world", "en", "vi").await?;
/// # Ok(())
/// # }
/// ```
pub async fn translate_text(
    text: &str,
    source_lang: &str,
    target_lang: &str,
) -> TranslatorResult<String> {
    let config = OrchestratorConfig::default_with_langs(source_lang, target_lang);
    let orchestrator = Orchestrator::from_config(config)?;
    orchestrator.on_text_change(text);
    orchestrator.submit().await
}
