//! HTTP 语言检测客户端
//!
//! `POST {url}`，请求体 `{"q": text}`，响应 `{"lang": "fr", "confidence": 0.92}`。

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::types::DetectionResult;
use super::{build_http_client, ensure_success, LanguageDetector};
use crate::translation::config::OrchestratorConfig;
use crate::translation::error::{TranslatorError, TranslatorResult};

#[derive(Debug, Serialize)]
struct DetectRequest<'a> {
    q: &'a str,
}

/// 语言检测 HTTP 客户端
#[derive(Clone)]
pub struct HttpLanguageDetector {
    url: String,
    api_key: Option<String>,
    http: Client,
}

impl HttpLanguageDetector {
    pub fn new(url: impl Into<String>, api_key: Option<String>) -> TranslatorResult<Self> {
        Ok(Self::with_client(url, api_key, build_http_client()?))
    }

    pub fn with_client(url: impl Into<String>, api_key: Option<String>, http: Client) -> Self {
        Self {
            url: url.into(),
            api_key,
            http,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> TranslatorResult<Self> {
        Self::new(config.detect_api_url.clone(), config.detect_api_key.clone())
    }
}

#[async_trait]
impl LanguageDetector for HttpLanguageDetector {
    async fn detect(&self, text: &str) -> TranslatorResult<DetectionResult> {
        if text.trim().is_empty() {
            return Err(TranslatorError::Detection("待检测文本为空".to_string()));
        }

        let mut request = self.http.post(&self.url).json(&DetectRequest { q: text });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = ensure_success(request.send().await?).await?;
        let body: DetectionResult = response.json().await?;
        normalize(body)
    }
}

fn normalize(mut result: DetectionResult) -> TranslatorResult<DetectionResult> {
    result.lang = result.lang.trim().to_string();
    if result.lang.is_empty() {
        return Err(TranslatorError::Provider("检测结果缺少语言代码".to_string()));
    }

    result.confidence = result
        .confidence
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translation::providers::test_server::{client, serve};

    #[test]
    fn test_normalize_detection() {
        let result = normalize(DetectionResult::new(" fr ", Some(1.4))).unwrap();
        assert_eq!(result.lang, "fr");
        assert_eq!(result.confidence, Some(1.0));

        let nan = normalize(DetectionResult::new("de", Some(f64::NAN))).unwrap();
        assert_eq!(nan.confidence, None);

        assert!(matches!(
            normalize(DetectionResult::new("", None)),
            Err(TranslatorError::Provider(_))
        ));
    }

    #[tokio::test]
    async fn test_detect_against_http_server() {
        let url = serve(200, r#"{"lang":"fr","confidence":0.92}"#).await;
        let detector = HttpLanguageDetector::with_client(url, Some("key".to_string()), client());
        assert_eq!(
            detector.detect("Bonjour tout le monde").await,
            Ok(DetectionResult::new("fr", Some(0.92)))
        );

        let failures = [
            (500, r#"{"error":"boom"}"#),
            (200, r#"{"error":"x"}"#),
            (200, r#"{"lang":""}"#),
        ];
        for (status, body) in failures {
            let url = serve(status, body).await;
            let detector = HttpLanguageDetector::with_client(url, None, client());
            let result = detector.detect("Bonjour").await;
            assert!(
                matches!(result, Err(TranslatorError::Provider(_))),
                "{} {} -> {:?}",
                status,
                body,
                result
            );
        }
    }

    #[tokio::test]
    async fn test_blank_text_rejected_locally() {
        let detector = HttpLanguageDetector::new("http://127.0.0.1:9/detect", None).unwrap();
        let result = detector.detect("\n\t ").await;
        assert!(matches!(result, Err(TranslatorError::Detection(_))));
    }
}
