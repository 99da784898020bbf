//! OCR.space 文字提取客户端
//!
//! 以 multipart 上传图片，响应中的 `ParsedResults[0].ParsedText` 即提取结果。
//! 也接受简化的 `{"parsedText": "..."}` 响应，方便接入自建服务。

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::Value;

use super::types::{ExtractionResult, ImageInput};
use super::{build_http_client, ensure_success, validate_image, OcrExtractor};
use crate::translation::config::OrchestratorConfig;
use crate::translation::error::{TranslatorError, TranslatorResult};

/// 应用语言代码到 OCR 语言代码，未知语言按英文处理
pub fn ocr_language_hint(lang: &str) -> &'static str {
    match lang.to_ascii_lowercase().as_str() {
        "en" => "eng",
        "vi" => "vie",
        "ja" => "jpn",
        "ko" => "kor",
        "zh" | "zh-cn" | "zh_hans" => "chs",
        "zh-tw" | "zh_hant" => "cht",
        "fr" => "fre",
        "de" => "ger",
        "es" => "spa",
        "ru" => "rus",
        _ => "eng",
    }
}

/// OCR.space HTTP 客户端
#[derive(Clone)]
pub struct OcrSpaceExtractor {
    url: String,
    api_key: Option<String>,
    http: Client,
}

impl OcrSpaceExtractor {
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
        Self::new(config.ocr_api_url.clone(), config.ocr_api_key.clone())
    }
}

#[async_trait]
impl OcrExtractor for OcrSpaceExtractor {
    async fn extract(
        &self,
        image: &ImageInput,
        language_hint: &str,
    ) -> TranslatorResult<ExtractionResult> {
        validate_image(image)?;

        let file_name = image.file_name.clone().unwrap_or_else(|| "image".to_string());
        let part = Part::bytes(image.bytes.clone())
            .file_name(file_name)
            .mime_str(&image.mime_type)
            .map_err(|e| TranslatorError::Validation(format!("无效的 MIME 类型: {}", e)))?;

        let form = Form::new()
            .text("language", ocr_language_hint(language_hint))
            .text("isOverlayRequired", "false")
            .part("file", part);

        let mut request = self.http.post(&self.url).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.header("apikey", key);
        }

        tracing::debug!("上传图片进行文字提取: {} 字节", image.bytes.len());
        let response = ensure_success(request.send().await?).await?;
        let body: Value = response.json().await?;

        let text = parse_ocr_response(&body)?;
        Ok(ExtractionResult {
            text,
            success: true,
        })
    }
}

/// 解析响应，服务端报错或文本为空都视为提取失败
fn parse_ocr_response(body: &Value) -> TranslatorResult<String> {
    if body
        .get("IsErroredOnProcessing")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        let message = match body.get("ErrorMessage") {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join("; "),
            Some(Value::String(s)) => s.clone(),
            _ => "未知错误".to_string(),
        };
        return Err(TranslatorError::Extraction(message));
    }

    let text = body
        .get("parsedText")
        .and_then(Value::as_str)
        .or_else(|| {
            body.get("ParsedResults")
                .and_then(|results| results.get(0))
                .and_then(|first| first.get("ParsedText"))
                .and_then(Value::as_str)
        })
        .map(str::trim)
        .unwrap_or_default();

    if text.is_empty() {
        return Err(TranslatorError::Extraction(
            "未能从图片中识别出文字".to_string(),
        ));
    }

    Ok(text.to_string())
}
