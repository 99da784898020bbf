//! Lingva 翻译客户端
//!
//! `GET {base}/{source}/{target}/{text}` 返回 `{"translation": "..."}`，
//! `GET {base}/languages` 返回 `{"languages": [{"code", "name"}]}`。

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::Client;
use serde::Deserialize;

use super::types::Language;
use super::{build_http_client, ensure_success, TranslationProvider};
use crate::translation::config::OrchestratorConfig;
use crate::translation::error::{TranslatorError, TranslatorResult};

/// 路径段编码，保留 RFC 3986 的非保留字符
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translation: Option<String>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LanguagesResponse {
    #[serde(default)]
    languages: Vec<Language>,
}

/// Lingva HTTP 客户端
#[derive(Clone)]
pub struct LingvaTranslator {
    base_url: String,
    http: Client,
}

impl LingvaTranslator {
    pub fn new(base_url: impl Into<String>) -> TranslatorResult<Self> {
        Ok(Self::with_client(base_url, build_http_client()?))
    }

    pub fn with_client(base_url: impl Into<String>, http: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http }
    }

    pub fn from_config(config: &OrchestratorConfig) -> TranslatorResult<Self> {
        Self::new(config.translate_api_url.clone())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 拼出翻译请求地址
    pub fn translate_url(&self, source_lang: &str, target_lang: &str, text: &str) -> String {
        format!(
            "{}/{}/{}/{}",
            self.base_url,
            utf8_percent_encode(source_lang, PATH_SEGMENT),
            utf8_percent_encode(target_lang, PATH_SEGMENT),
            utf8_percent_encode(text, PATH_SEGMENT)
        )
    }
}

#[async_trait]
impl TranslationProvider for LingvaTranslator {
    async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> TranslatorResult<String> {
        if text.trim().is_empty() {
            return Err(TranslatorError::Translation("待翻译文本为空".to_string()));
        }

        let url = self.translate_url(source_lang, target_lang, text);
        tracing::debug!("请求翻译: {}→{} ({} 字符)", source_lang, target_lang, text.chars().count());

        let response = ensure_success(self.http.get(&url).send().await?).await?;
        let body: TranslateResponse = response.json().await?;

        match body.translation {
            Some(translation) => Ok(translation),
            None => Err(TranslatorError::Provider(
                body.error
                    .unwrap_or_else(|| "响应缺少 translation 字段".to_string()),
            )),
        }
    }

    async fn languages(&self) -> TranslatorResult<Vec<Language>> {
        let url = format!("{}/languages", self.base_url);
        let response = ensure_success(self.http.get(&url).send().await?).await?;
        let body: LanguagesResponse = response.json().await?;
        Ok(body.languages)
    }
}
