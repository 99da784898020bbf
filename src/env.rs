//! 统一的环境变量管理系统
//!
//! 提供类型安全、可验证的环境变量访问，用于覆盖配置文件中的值

use std::env;
use std::fmt;
use std::time::Duration;

/// 环境变量解析错误
#[derive(Debug, Clone)]
pub struct EnvError {
    pub variable: String,
    pub message: String,
}

impl fmt::Display for EnvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Environment variable '{}': {}", self.variable, self.message)
    }
}

impl std::error::Error for EnvError {}

pub type EnvResult<T> = Result<T, EnvError>;

/// 环境变量访问器特性
pub trait EnvVar<T> {
    const NAME: &'static str;
    const DEFAULT: Option<T>;
    const DESCRIPTION: &'static str;

    fn parse(value: &str) -> EnvResult<T>;

    fn get() -> EnvResult<T> {
        match env::var(Self::NAME) {
            Ok(value) => Self::parse(&value),
            Err(_) => {
                if let Some(default) = Self::DEFAULT {
                    Ok(default)
                } else {
                    Err(EnvError {
                        variable: Self::NAME.to_string(),
                        message: "Required environment variable not set".to_string(),
                    })
                }
            }
        }
    }

    fn get_or_default(default: T) -> T {
        Self::get().unwrap_or(default)
    }

    /// 仅在变量被显式设置时返回值，解析失败会记录警告
    fn get_override() -> Option<T> {
        let value = env::var(Self::NAME).ok()?;
        match Self::parse(&value) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("忽略无效的环境变量: {}", e);
                None
            }
        }
    }
}

/// 核心环境变量定义
pub mod core {
    use super::*;

    /// 日志级别
    pub struct LogLevel;
    impl EnvVar<String> for LogLevel {
        const NAME: &'static str = "GEASY_LOG_LEVEL";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("info".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Log level: trace, debug, info, warn, error";

        fn parse(value: &str) -> EnvResult<String> {
            match value.to_lowercase().as_str() {
                "trace" | "debug" | "info" | "warn" | "error" => Ok(value.to_lowercase()),
                _ => Err(EnvError {
                    variable: Self::NAME.to_string(),
                    message: format!(
                        "Invalid log level '{}'. Use: trace, debug, info, warn, error",
                        value
                    ),
                }),
            }
        }
    }
}

/// 翻译、检测和OCR服务相关环境变量
pub mod translator {
    use super::*;

    /// 翻译API地址
    pub struct TranslateApiUrl;
    impl EnvVar<String> for TranslateApiUrl {
        const NAME: &'static str = "GEASY_TRANSLATE_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Translation API base URL (Lingva-compatible)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 语言检测API地址
    pub struct DetectApiUrl;
    impl EnvVar<String> for DetectApiUrl {
        const NAME: &'static str = "GEASY_DETECT_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Language detection endpoint URL";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// 语言检测API密钥
    pub struct DetectApiKey;
    impl EnvVar<String> for DetectApiKey {
        const NAME: &'static str = "GEASY_DETECT_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "Bearer token for the detection endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// OCR API地址
    pub struct OcrApiUrl;
    impl EnvVar<String> for OcrApiUrl {
        const NAME: &'static str = "GEASY_OCR_API_URL";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "OCR endpoint URL (OCR.space-compatible)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_http_url(value, Self::NAME)
        }
    }

    /// OCR API密钥
    pub struct OcrApiKey;
    impl EnvVar<String> for OcrApiKey {
        const NAME: &'static str = "GEASY_OCR_API_KEY";
        const DEFAULT: Option<String> = None;
        const DESCRIPTION: &'static str = "API key sent to the OCR endpoint";

        fn parse(value: &str) -> EnvResult<String> {
            parse_non_empty(value, Self::NAME)
        }
    }

    /// 默认源语言
    pub struct SourceLang;
    impl EnvVar<String> for SourceLang {
        const NAME: &'static str = "GEASY_SOURCE_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("en".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Initial source language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang_code(value, Self::NAME)
        }
    }

    /// 默认目标语言
    pub struct TargetLang;
    impl EnvVar<String> for TargetLang {
        const NAME: &'static str = "GEASY_TARGET_LANG";
        const DEFAULT: Option<String> = None;

        fn get() -> EnvResult<String> {
            match env::var(Self::NAME) {
                Ok(value) => Self::parse(&value),
                Err(_) => Ok("vi".to_string()),
            }
        }
        const DESCRIPTION: &'static str = "Initial target language (ISO 639-1 code)";

        fn parse(value: &str) -> EnvResult<String> {
            parse_lang_code(value, Self::NAME)
        }
    }

    /// 防抖间隔
    pub struct DebounceMs;
    impl EnvVar<Duration> for DebounceMs {
        const NAME: &'static str = "GEASY_DEBOUNCE_MS";
        const DEFAULT: Option<Duration> = Some(Duration::from_millis(300));
        const DESCRIPTION: &'static str = "Debounce window in milliseconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            let millis = parse_positive_usize(value, Self::NAME, 1, 10_000)?;
            Ok(Duration::from_millis(millis as u64))
        }
    }

    /// 单次请求超时
    pub struct RequestTimeout;
    impl EnvVar<Duration> for RequestTimeout {
        const NAME: &'static str = "GEASY_REQUEST_TIMEOUT";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(10));
        const DESCRIPTION: &'static str = "Per-call provider timeout in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 300)
        }
    }
}

/// 缓存相关环境变量
pub mod cache {
    use super::*;

    /// 缓存TTL
    pub struct Ttl;
    impl EnvVar<Duration> for Ttl {
        const NAME: &'static str = "GEASY_CACHE_TTL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(1800));
        const DESCRIPTION: &'static str = "Cache TTL in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400)
        }
    }

    /// 过期清理间隔
    pub struct SweepInterval;
    impl EnvVar<Duration> for SweepInterval {
        const NAME: &'static str = "GEASY_CACHE_SWEEP_INTERVAL";
        const DEFAULT: Option<Duration> = Some(Duration::from_secs(300));
        const DESCRIPTION: &'static str = "Interval between expired-entry sweeps in seconds";

        fn parse(value: &str) -> EnvResult<Duration> {
            parse_seconds(value, Self::NAME, 1, 86400)
        }
    }

    /// 缓存条目上限（未设置时只按TTL清理）
    pub struct MaxEntries;
    impl EnvVar<usize> for MaxEntries {
        const NAME: &'static str = "GEASY_CACHE_MAX_ENTRIES";
        const DEFAULT: Option<usize> = None;
        const DESCRIPTION: &'static str = "Optional LRU bound on cached translations";

        fn parse(value: &str) -> EnvResult<usize> {
            parse_positive_usize(value, Self::NAME, 1, 1_000_000)
        }
    }
}

/// 辅助函数
fn parse_http_url(value: &str, var_name: &str) -> EnvResult<String> {
    let url = value.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: "URL must start with http:// or https://".to_string(),
        })
    }
}

fn parse_non_empty(value: &str, var_name: &str) -> EnvResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: "Value must not be empty".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

fn parse_lang_code(value: &str, var_name: &str) -> EnvResult<String> {
    let lang = value.trim().to_lowercase();
    let valid = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic());
    // 允许 zh-TW 这类地区变体
    let valid_region = lang.len() == 5
        && lang.as_bytes()[2] == b'-'
        && lang.chars().filter(|c| *c != '-').all(|c| c.is_ascii_alphabetic());
    if valid || valid_region {
        Ok(lang)
    } else {
        Err(EnvError {
            variable: var_name.to_string(),
            message: "Language code must be ISO 639 (e.g. 'en', 'vi', 'zh-tw')".to_string(),
        })
    }
}

/// 整数秒，拒绝小数和带单位的写法
fn parse_seconds(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<Duration> {
    let value = value.trim();
    if !value.is_empty() && !value.chars().all(|c| c.is_ascii_digit()) {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!(
                "Must be a whole number of seconds (e.g. '10'), got '{}'",
                value
            ),
        });
    }

    let seconds = parse_positive_usize(value, var_name, min, max)?;
    Ok(Duration::from_secs(seconds as u64))
}

fn parse_positive_usize(value: &str, var_name: &str, min: usize, max: usize) -> EnvResult<usize> {
    let num: usize = value.trim().parse().map_err(|_| EnvError {
        variable: var_name.to_string(),
        message: "Must be a valid positive number".to_string(),
    })?;

    if num < min {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} is below minimum {}", num, min),
        });
    }

    if num > max {
        return Err(EnvError {
            variable: var_name.to_string(),
            message: format!("Value {} exceeds maximum {}", num, max),
        });
    }

    Ok(num)
}

/// 环境变量文档生成器
pub fn generate_env_docs() -> String {
    let mut docs = String::new();
    docs.push_str("# Environment Variables\n\n");

    let mut line = |name: &str, description: &str, default: String| {
        docs.push_str(&format!("- `{}`: {} (default: {})\n", name, description, default));
    };

    line(core::LogLevel::NAME, core::LogLevel::DESCRIPTION, "info".into());
    line(
        translator::TranslateApiUrl::NAME,
        translator::TranslateApiUrl::DESCRIPTION,
        "config".into(),
    );
    line(
        translator::DetectApiUrl::NAME,
        translator::DetectApiUrl::DESCRIPTION,
        "config".into(),
    );
    line(
        translator::DetectApiKey::NAME,
        translator::DetectApiKey::DESCRIPTION,
        "unset".into(),
    );
    line(
        translator::OcrApiUrl::NAME,
        translator::OcrApiUrl::DESCRIPTION,
        "config".into(),
    );
    line(
        translator::OcrApiKey::NAME,
        translator::OcrApiKey::DESCRIPTION,
        "unset".into(),
    );
    line(
        translator::SourceLang::NAME,
        translator::SourceLang::DESCRIPTION,
        "en".into(),
    );
    line(
        translator::TargetLang::NAME,
        translator::TargetLang::DESCRIPTION,
        "vi".into(),
    );
    line(
        translator::DebounceMs::NAME,
        translator::DebounceMs::DESCRIPTION,
        format!("{:?}", translator::DebounceMs::DEFAULT),
    );
    line(
        translator::RequestTimeout::NAME,
        translator::RequestTimeout::DESCRIPTION,
        format!("{:?}", translator::RequestTimeout::DEFAULT),
    );
    line(
        cache::Ttl::NAME,
        cache::Ttl::DESCRIPTION,
        format!("{:?}", cache::Ttl::DEFAULT),
    );
    line(
        cache::SweepInterval::NAME,
        cache::SweepInterval::DESCRIPTION,
        format!("{:?}", cache::SweepInterval::DEFAULT),
    );
    line(
        cache::MaxEntries::NAME,
        cache::MaxEntries::DESCRIPTION,
        "unbounded".into(),
    );

    docs
}
