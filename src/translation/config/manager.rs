//! 简化的配置管理器
//!
//! 提供统一的配置接口，支持文件配置、环境变量和默认值

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::constants;
use crate::translation::error::{TranslatorError, TranslatorResult};

/// 翻译编排配置
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    // 服务地址
    pub translate_api_url: String,
    pub detect_api_url: String,
    pub detect_api_key: Option<String>,
    pub ocr_api_url: String,
    pub ocr_api_key: Option<String>,

    // 初始语言
    pub default_source_lang: String,
    pub default_target_lang: String,

    // 调度配置
    pub debounce_ms: u64,
    pub request_timeout_secs: u64,
    pub detection_min_chars: usize,

    // 缓存配置
    pub cache_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    pub cache_max_entries: Option<usize>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            translate_api_url: constants::DEFAULT_TRANSLATE_API_URL.to_string(),
            detect_api_url: constants::DEFAULT_DETECT_API_URL.to_string(),
            detect_api_key: None,
            ocr_api_url: constants::DEFAULT_OCR_API_URL.to_string(),
            ocr_api_key: None,

            default_source_lang: constants::DEFAULT_SOURCE_LANG.to_string(),
            default_target_lang: constants::DEFAULT_TARGET_LANG.to_string(),

            debounce_ms: constants::DEFAULT_DEBOUNCE.as_millis() as u64,
            request_timeout_secs: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            detection_min_chars: constants::DETECTION_MIN_CHARS,

            cache_ttl_secs: constants::DEFAULT_CACHE_TTL.as_secs(),
            sweep_interval_secs: constants::DEFAULT_SWEEP_INTERVAL.as_secs(),
            cache_max_entries: None,
        }
    }
}

impl OrchestratorConfig {
    /// 创建带指定语言对的默认配置
    pub fn default_with_langs(source_lang: &str, target_lang: &str) -> Self {
        Self {
            default_source_lang: source_lang.to_string(),
            default_target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 验证配置
    pub fn validate(&self) -> TranslatorResult<()> {
        for (name, value) in [
            ("translate_api_url", &self.translate_api_url),
            ("detect_api_url", &self.detect_api_url),
            ("ocr_api_url", &self.ocr_api_url),
        ] {
            let url = Url::parse(value)
                .map_err(|e| TranslatorError::Config(format!("{} 无效: {}", name, e)))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(TranslatorError::Config(format!(
                    "{} 必须使用 http 或 https",
                    name
                )));
            }
        }

        if self.default_source_lang.trim().is_empty() || self.default_target_lang.trim().is_empty()
        {
            return Err(TranslatorError::Config("语言代码不能为空".to_string()));
        }

        if self.debounce_ms == 0 {
            return Err(TranslatorError::Config("防抖间隔不能为0".to_string()));
        }

        if self.request_timeout_secs == 0 {
            return Err(TranslatorError::Config("请求超时不能为0".to_string()));
        }

        if self.cache_ttl_secs == 0 {
            return Err(TranslatorError::Config("缓存TTL不能为0".to_string()));
        }

        if self.sweep_interval_secs == 0 {
            return Err(TranslatorError::Config("清理间隔不能为0".to_string()));
        }

        if self.cache_max_entries == Some(0) {
            return Err(TranslatorError::Config("缓存上限不能为0".to_string()));
        }

        Ok(())
    }

    /// 应用环境变量覆盖
    pub fn apply_env_overrides(&mut self) {
        use crate::env::{cache, translator, EnvVar};

        if let Some(url) = translator::TranslateApiUrl::get_override() {
            tracing::info!("环境变量覆盖翻译 API: {}", url);
            self.translate_api_url = url;
        }

        if let Some(url) = translator::DetectApiUrl::get_override() {
            self.detect_api_url = url;
        }

        if let Some(key) = translator::DetectApiKey::get_override() {
            self.detect_api_key = Some(key);
        }

        if let Some(url) = translator::OcrApiUrl::get_override() {
            self.ocr_api_url = url;
        }

        if let Some(key) = translator::OcrApiKey::get_override() {
            self.ocr_api_key = Some(key);
        }

        if let Some(lang) = translator::SourceLang::get_override() {
            self.default_source_lang = lang;
        }

        if let Some(lang) = translator::TargetLang::get_override() {
            self.default_target_lang = lang;
        }

        if let Some(debounce) = translator::DebounceMs::get_override() {
            self.debounce_ms = debounce.as_millis() as u64;
        }

        if let Some(timeout) = translator::RequestTimeout::get_override() {
            self.request_timeout_secs = whole_secs(timeout);
        }

        // 缓存相关环境变量
        if let Some(ttl) = cache::Ttl::get_override() {
            self.cache_ttl_secs = whole_secs(ttl);
        }

        if let Some(interval) = cache::SweepInterval::get_override() {
            self.sweep_interval_secs = whole_secs(interval);
        }

        if let Some(max) = cache::MaxEntries::get_override() {
            self.cache_max_entries = Some(max);
        }
    }

    /// 转换为Duration类型
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// 简化的配置管理器
pub struct ConfigManager {
    config: OrchestratorConfig,
}

impl ConfigManager {
    /// 创建新的配置管理器：.env → 配置文件 → 环境变量覆盖 → 验证
    pub fn new() -> TranslatorResult<Self> {
        let mut config = Self::load_config()?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 从指定文件创建配置管理器
    pub fn from_file(path: &str) -> TranslatorResult<Self> {
        let expanded = shellexpand::tilde(path);
        let mut config = Self::load_from_file(&expanded)?;
        config.apply_env_overrides();
        config.validate()?;

        Ok(Self { config })
    }

    /// 获取配置
    pub fn get_config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// 取出配置
    pub fn into_config(self) -> OrchestratorConfig {
        self.config
    }

    /// 从搜索路径加载配置
    fn load_config() -> TranslatorResult<OrchestratorConfig> {
        // 首先尝试加载 .env 文件
        Self::load_dotenv();

        for path in constants::CONFIG_PATHS {
            let expanded_path = shellexpand::tilde(path);
            if Path::new(expanded_path.as_ref()).exists() {
                tracing::info!("加载配置文件: {}", expanded_path);
                return Self::load_from_file(&expanded_path);
            }
        }

        tracing::info!("未找到配置文件，使用默认配置");
        Ok(OrchestratorConfig::default())
    }

    /// 从指定文件加载配置
    fn load_from_file(path: &str) -> TranslatorResult<OrchestratorConfig> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TranslatorError::Config(format!("读取配置文件失败: {}", e)))?;

        if path.ends_with(".json") {
            serde_json::from_str(&content)
                .map_err(|e| TranslatorError::Config(format!("解析JSON配置失败: {}", e)))
        } else {
            toml::from_str(&content)
                .map_err(|e| TranslatorError::Config(format!("解析TOML配置失败: {}", e)))
        }
    }

    /// 加载 .env 文件
    fn load_dotenv() {
        let env_files = [".env.local", ".env"];

        for env_file in &env_files {
            if Path::new(env_file).exists() && dotenv::from_filename(env_file).is_ok() {
                tracing::info!("已加载环境变量文件: {}", env_file);
                break;
            }
        }
    }

    /// 生成示例配置文件
    pub fn generate_example_config(path: &str) -> TranslatorResult<()> {
        let config = OrchestratorConfig::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| TranslatorError::Config(format!("序列化配置失败: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TranslatorError::Config(format!("写入配置文件失败: {}", e)))?;

        Ok(())
    }
}

/// 不足一秒的部分向上取整，避免截断成 0
fn whole_secs(duration: Duration) -> u64 {
    duration.as_secs() + u64::from(duration.subsec_nanos() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = OrchestratorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.cache_ttl(), Duration::from_secs(1800));
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.detection_min_chars, 50);
        assert!(config.cache_max_entries.is_none());
    }

    #[test]
    fn test_whole_secs_rounds_up() {
        assert_eq!(whole_secs(Duration::from_millis(500)), 1);
        assert_eq!(whole_secs(Duration::from_secs(10)), 10);
        assert_eq!(whole_secs(Duration::from_millis(2_001)), 3);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config = OrchestratorConfig::default();
        config.debounce_ms = 0;
        assert!(matches!(config.validate(), Err(TranslatorError::Config(_))));

        let mut config = OrchestratorConfig::default();
        config.ocr_api_url = "ftp://example.com/ocr".to_string();
        assert!(config.validate().is_err());

        let mut config = OrchestratorConfig::default();
        config.cache_max_entries = Some(0);
        assert!(config.validate().is_err());

        let mut config = OrchestratorConfig::default();
        config.default_target_lang = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: OrchestratorConfig = toml::from_str(
            r#"
            default_source_lang = "ja"
            debounce_ms = 150
            cache_max_entries = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.default_source_lang, "ja");
        assert_eq!(config.default_target_lang, "vi");
        assert_eq!(config.debounce_ms, 150);
        assert_eq!(config.cache_max_entries, Some(500));
        assert_eq!(config.translate_api_url, constants::DEFAULT_TRANSLATE_API_URL);
    }

    #[test]
    fn test_generate_and_reload_example_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geasy-translate.toml");
        let path = path.to_str().unwrap();

        ConfigManager::generate_example_config(path).unwrap();
        let manager = ConfigManager::from_file(path).unwrap();
        assert_eq!(manager.get_config().debounce_ms, 300);
    }

    #[test]
    fn test_json_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "default_target_lang": "ko", "request_timeout_secs": 5 }"#,
        )
        .unwrap();

        let config = ConfigManager::from_file(path.to_str().unwrap())
            .unwrap()
            .into_config();
        assert_eq!(config.default_target_lang, "ko");
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = ConfigManager::from_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(TranslatorError::Config(_))));
    }
}
