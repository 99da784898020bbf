//! # G-Easy Translate
//!
//! 翻译请求编排引擎：对输入做防抖，复用近期结果，并保证显示的译文总是对应当前输入。
//!
//! ## 模块组织
//!
//! - `translation` - 调度器、编排器、外部服务、缓存与配置
//! - `env` - 类型安全的环境变量访问

pub mod env;
pub mod translation;

// Re-export commonly used items for convenience
pub use translation::{
    ConfigManager, Orchestrator, OrchestratorConfig, TranslationCache, TranslatorError,
    TranslatorResult, TranslatorState,
};
