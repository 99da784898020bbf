//! 翻译编排统一错误处理
//!
//! 提供结构化错误类型和错误处理机制。每个错误只作用于单次请求，
//! 用户重复触发操作即可恢复，不会导致进程退出。

use std::fmt;

use thiserror::Error;

/// 翻译编排错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TranslatorError {
    /// 输入验证错误（在任何网络调用之前拒绝）
    #[error("输入无效: {0}")]
    Validation(String),

    /// 网络错误（传输失败或超时）
    #[error("网络错误: {0}")]
    Network(String),

    /// 服务端错误（非成功响应或响应格式不正确）
    #[error("服务端错误: {0}")]
    Provider(String),

    /// 语言检测失败
    #[error("语言检测失败: {0}")]
    Detection(String),

    /// 翻译失败
    #[error("翻译失败: {0}")]
    Translation(String),

    /// 图片文字提取失败
    #[error("文字提取失败: {0}")]
    Extraction(String),

    /// 配置错误
    #[error("配置错误: {0}")]
    Config(String),

    /// 序列化错误
    #[error("序列化错误: {0}")]
    Serialization(String),

    /// 过期结果已丢弃，仅用于内部记录，不会展示给界面
    #[error("请求 #{0} 的结果已过期并被丢弃")]
    StaleResultDiscarded(u64),
}

impl TranslatorError {
    /// 检查错误是否可重试
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslatorError::Network(_) => true,
            TranslatorError::Provider(_) => true,
            TranslatorError::Detection(_) => true,
            TranslatorError::Translation(_) => true,
            TranslatorError::Extraction(_) => true,
            TranslatorError::Validation(_) => false,
            TranslatorError::Config(_) => false,
            TranslatorError::Serialization(_) => false,
            TranslatorError::StaleResultDiscarded(_) => false,
        }
    }

    /// 是否应该展示给界面
    pub fn is_user_visible(&self) -> bool {
        !matches!(self, TranslatorError::StaleResultDiscarded(_))
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TranslatorError::Validation(_) => ErrorSeverity::Info,
            TranslatorError::Network(_) => ErrorSeverity::Warning,
            TranslatorError::Provider(_) => ErrorSeverity::Error,
            TranslatorError::Detection(_) => ErrorSeverity::Warning,
            TranslatorError::Translation(_) => ErrorSeverity::Error,
            TranslatorError::Extraction(_) => ErrorSeverity::Error,
            TranslatorError::Config(_) => ErrorSeverity::Critical,
            TranslatorError::Serialization(_) => ErrorSeverity::Error,
            TranslatorError::StaleResultDiscarded(_) => ErrorSeverity::Info,
        }
    }

    /// 获取错误类别
    pub fn category(&self) -> ErrorCategory {
        match self {
            TranslatorError::Validation(_) => ErrorCategory::Input,
            TranslatorError::Network(_) => ErrorCategory::Network,
            TranslatorError::Provider(_) => ErrorCategory::Service,
            TranslatorError::Detection(_) => ErrorCategory::Service,
            TranslatorError::Translation(_) => ErrorCategory::Service,
            TranslatorError::Extraction(_) => ErrorCategory::Service,
            TranslatorError::Config(_) => ErrorCategory::Configuration,
            TranslatorError::Serialization(_) => ErrorCategory::Serialization,
            TranslatorError::StaleResultDiscarded(_) => ErrorCategory::Internal,
        }
    }

    /// 创建带上下文的错误
    pub fn with_context<T: fmt::Display>(mut self, context: T) -> Self {
        let append = |msg: &mut String| {
            let new_msg = format!("{} (上下文: {})", msg, context);
            *msg = new_msg;
        };

        match &mut self {
            TranslatorError::Validation(ref mut msg)
            | TranslatorError::Network(ref mut msg)
            | TranslatorError::Provider(ref mut msg)
            | TranslatorError::Detection(ref mut msg)
            | TranslatorError::Translation(ref mut msg)
            | TranslatorError::Extraction(ref mut msg)
            | TranslatorError::Config(ref mut msg)
            | TranslatorError::Serialization(ref mut msg) => append(msg),
            TranslatorError::StaleResultDiscarded(_) => {}
        }

        self
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Input,
    Service,
    Serialization,
    Internal,
}

/// 标准错误转换
impl From<std::io::Error> for TranslatorError {
    fn from(error: std::io::Error) -> Self {
        TranslatorError::Network(format!("IO错误: {}", error))
    }
}

impl From<serde_json::Error> for TranslatorError {
    fn from(error: serde_json::Error) -> Self {
        TranslatorError::Serialization(format!("JSON序列化错误: {}", error))
    }
}

impl From<toml::de::Error> for TranslatorError {
    fn from(error: toml::de::Error) -> Self {
        TranslatorError::Config(format!("TOML解析错误: {}", error))
    }
}

impl From<reqwest::Error> for TranslatorError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            TranslatorError::Provider(format!("响应解析失败: {}", error))
        } else if let Some(status) = error.status() {
            TranslatorError::Provider(format!("HTTP {}: {}", status, error))
        } else {
            helpers::network_error(error)
        }
    }
}

impl From<tokio::time::error::Elapsed> for TranslatorError {
    fn from(error: tokio::time::error::Elapsed) -> Self {
        helpers::network_error(format!("请求超时: {}", error))
    }
}

/// 错误结果类型别名
pub type TranslatorResult<T> = Result<T, TranslatorError>;

/// 错误统计信息
#[derive(Debug, Clone, Default)]
pub struct ErrorStats {
    pub total_errors: usize,
    pub by_category: std::collections::HashMap<ErrorCategory, usize>,
    pub by_severity: std::collections::HashMap<ErrorSeverity, usize>,
    pub retryable_errors: usize,
    pub critical_errors: usize,
}

impl ErrorStats {
    /// 记录错误
    pub fn record_error(&mut self, error: &TranslatorError) {
        self.total_errors += 1;

        let category = error.category();
        *self.by_category.entry(category).or_insert(0) += 1;

        let severity = error.severity();
        *self.by_severity.entry(severity).or_insert(0) += 1;

        if error.is_retryable() {
            self.retryable_errors += 1;
        }

        if severity == ErrorSeverity::Critical {
            self.critical_errors += 1;
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Default::default();
    }

    /// 获取错误率
    pub fn error_rate(&self, total_operations: usize) -> f64 {
        if total_operations == 0 {
            0.0
        } else {
            self.total_errors as f64 / total_operations as f64
        }
    }
}

/// 错误处理助手函数
pub mod helpers {
    use super::*;

    /// 按严重程度记录日志并返回错误
    pub fn log_error<T>(error: TranslatorError) -> TranslatorResult<T> {
        match error.severity() {
            ErrorSeverity::Info => tracing::info!("翻译信息: {}", error),
            ErrorSeverity::Warning => tracing::warn!("翻译警告: {}", error),
            ErrorSeverity::Error => tracing::error!("翻译错误: {}", error),
            ErrorSeverity::Critical => tracing::error!("翻译严重错误: {}", error),
        }

        Err(error)
    }

    /// 创建网络错误
    pub fn network_error<T: fmt::Display>(msg: T) -> TranslatorError {
        TranslatorError::Network(msg.to_string())
    }

    /// 创建服务端错误
    pub fn provider_error<T: fmt::Display>(msg: T) -> TranslatorError {
        TranslatorError::Provider(msg.to_string())
    }

    /// 创建配置错误
    pub fn config_error<T: fmt::Display>(msg: T) -> TranslatorError {
        TranslatorError::Config(msg.to_string())
    }

    /// 创建输入验证错误
    pub fn validation_error<T: fmt::Display>(msg: T) -> TranslatorError {
        TranslatorError::Validation(msg.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stale_result_is_never_user_visible() {
        let stale = TranslatorError::StaleResultDiscarded(7);
        assert!(!stale.is_user_visible());
        assert!(!stale.is_retryable());
        assert_eq!(stale.category(), ErrorCategory::Internal);

        assert!(TranslatorError::Network("down".into()).is_user_visible());
    }

    #[test]
    fn test_with_context_appends_message() {
        let err = TranslatorError::Provider("缺少 translation 字段".into()).with_context("en→vi");
        assert!(err.to_string().contains("en→vi"));

        let stale = TranslatorError::StaleResultDiscarded(3).with_context("ignored");
        assert_eq!(stale, TranslatorError::StaleResultDiscarded(3));
    }

    #[test]
    fn test_error_stats_tracks_categories() {
        let mut stats = ErrorStats::default();
        stats.record_error(&TranslatorError::Network("timeout".into()));
        stats.record_error(&TranslatorError::Config("bad".into()));
        stats.record_error(&TranslatorError::Validation("not an image".into()));

        assert_eq!(stats.total_errors, 3);
        assert_eq!(stats.retryable_errors, 1);
        assert_eq!(stats.critical_errors, 1);
        assert_eq!(stats.by_category.get(&ErrorCategory::Input), Some(&1));
        assert_eq!(stats.error_rate(6), 0.5);

        stats.reset();
        assert_eq!(stats.total_errors, 0);
    }

    #[test]
    fn test_elapsed_maps_to_network() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let err: TranslatorError = rt.block_on(async {
            tokio::time::timeout(
                std::time::Duration::from_millis(1),
                std::future::pending::<()>(),
            )
            .await
            .unwrap_err()
            .into()
        });
        assert!(matches!(err, TranslatorError::Network(_)));
    }
}
