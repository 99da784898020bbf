//! 可选语言列表
//!
//! 优先从翻译服务拉取，失败时退回内置列表。

use super::types::Language;
use super::TranslationProvider;

/// 内置语言列表 (code, name)
pub const FALLBACK_LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("vi", "Vietnamese"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("zh", "Chinese"),
    ("zh_HANT", "Chinese (Traditional)"),
    ("fr", "French"),
    ("de", "German"),
    ("es", "Spanish"),
    ("it", "Italian"),
    ("pt", "Portuguese"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("th", "Thai"),
    ("id", "Indonesian"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("sv", "Swedish"),
];

/// 语言目录
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageCatalog {
    languages: Vec<Language>,
    from_provider: bool,
}

impl LanguageCatalog {
    /// 内置列表
    pub fn fallback() -> Self {
        Self {
            languages: FALLBACK_LANGUAGES
                .iter()
                .map(|(code, name)| Language::new(code, name))
                .collect(),
            from_provider: false,
        }
    }

    /// 从翻译服务加载，失败或返回空列表时使用内置列表
    pub async fn load(provider: &dyn TranslationProvider) -> Self {
        let languages = provider.languages().await.map(|languages| {
            languages
                .into_iter()
                .filter(|lang| lang.code != "auto")
                .collect::<Vec<_>>()
        });

        match languages {
            Ok(languages) if !languages.is_empty() => {
                tracing::info!("已从翻译服务加载 {} 种语言", languages.len());
                Self {
                    languages,
                    from_provider: true,
                }
            }
            Ok(_) => {
                tracing::warn!("翻译服务返回空语言列表，使用内置列表");
                Self::fallback()
            }
            Err(e) => {
                tracing::warn!("获取语言列表失败，使用内置列表: {}", e);
                Self::fallback()
            }
        }
    }

    pub fn languages(&self) -> &[Language] {
        &self.languages
    }

    /// 是否来自翻译服务
    pub fn is_from_provider(&self) -> bool {
        self.from_provider
    }

    pub fn name_of(&self, code: &str) -> Option<&str> {
        self.languages
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
            .map(|lang| lang.name.as_str())
    }

    pub fn contains(&self, code: &str) -> bool {
        self.name_of(code).is_some()
    }
}

impl Default for LanguageCatalog {
    fn default() -> Self {
        Self::fallback()
    }
}
