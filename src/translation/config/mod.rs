//! 翻译编排配置管理模块
//!
//! 提供简化的配置管理，支持环境变量、配置文件和默认值

pub mod manager;

// 重新导出主要类型
pub use manager::{ConfigManager, OrchestratorConfig};

/// 配置常量
pub mod constants {
    use std::time::Duration;

    // 请求调度相关
    pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

    // 语言检测门槛（严格大于）
    pub const DETECTION_MIN_CHARS: usize = 50;

    // 默认API设置
    pub const DEFAULT_TRANSLATE_API_URL: &str = "https://lingva.ml/api/v1";
    pub const DEFAULT_DETECT_API_URL: &str = "http://localhost:8080/detect";
    pub const DEFAULT_OCR_API_URL: &str = "https://api.ocr.space/parse/image";
    pub const DEFAULT_SOURCE_LANG: &str = "en";
    pub const DEFAULT_TARGET_LANG: &str = "vi";

    // 缓存设置
    pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60); // 30分钟
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

    // 配置文件搜索路径
    pub const CONFIG_PATHS: &[&str] = &[
        "geasy-translate.toml",
        ".geasy-translate.toml",
        "geasy-translate.json",
        "~/.config/geasy/translate.toml",
        "/etc/geasy/translate.toml",
    ];
}
