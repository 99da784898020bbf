//! 翻译系统核心模块
//!
//! 负责把用户输入变成译文，同时处理重叠的异步请求：
//!
//! - **调度层** (`scheduler.rs`): 防抖、序号分配、过期结果丢弃
//! - **编排层** (`orchestrator.rs`): 文本路径、图片路径、语言交换、语言检测
//! - **状态** (`state.rs`): UI 层读取的可观察状态
//! - **统计** (`stats.rs`): 原子计数器
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! use geasy_translate::translation::config::OrchestratorConfig;
//! use geasy_translate::translation::core::Orchestrator;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let orchestrator = Orchestrator::from_config(OrchestratorConfig::default())?;
//!
//! orchestrator.on_text_change("Hello world");
//! let state = orchestrator.settled().await;
//! println!("{}", state.translated_text);
//! # Ok(())
//! # }
//! ```
//!
//! ## 模块依赖关系
//!
//! ```text
//! Orchestrator (orchestrator.rs)
//!     ├── LanguageDetector (providers/detector.rs)
//!     ├── OcrExtractor (providers/ocr.rs)
//!     └── RequestScheduler (scheduler.rs)
//!             ├── TranslationCache (storage/cache.rs)
//!             └── TranslationProvider (providers/translator.rs)
//! ```

pub mod orchestrator;
pub mod scheduler;
pub mod state;
pub mod stats;

/// 翻译编排器 - 主要的对外接口
pub use orchestrator::Orchestrator;

/// 请求调度器及其状态机类型
pub use scheduler::{
    DispatchedRequest, RequestScheduler, RequestStatus, SchedulerConfig, SchedulerPhase,
    TranslationJob,
};

/// 可观察状态
pub use state::{StateHandle, TranslationMode, TranslatorState};

/// 服务运行统计信息
pub use stats::{ServiceStats, ServiceStatsSnapshot};
