//! 外部服务共享的数据类型

use serde::{Deserialize, Serialize};

use super::languages::LanguageCatalog;

/// 语言检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    pub lang: String,
    /// 0–1 之间的置信度，服务端可能不提供
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl DetectionResult {
    pub fn new(lang: impl Into<String>, confidence: Option<f64>) -> Self {
        Self {
            lang: lang.into(),
            confidence,
        }
    }

    /// 渲染为 "French (92%)"，没有置信度时只显示语言名
    pub fn describe(&self, catalog: &LanguageCatalog) -> String {
        let name = catalog.name_of(&self.lang).unwrap_or(&self.lang);
        match self.confidence {
            Some(confidence) => format!("{} ({}%)", name, (confidence * 100.0).round() as i64),
            None => name.to_string(),
        }
    }
}

/// 图片文字提取结果
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionResult {
    pub text: String,
    pub success: bool,
}

/// 可选语言
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub code: String,
    pub name: String,
}

impl Language {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

/// 待识别的图片
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub bytes: Vec<u8>,
    /// 声明的 MIME 类型，例如 `image/png`
    pub mime_type: String,
    pub file_name: Option<String>,
}

impl ImageInput {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// 读取本地文件，按扩展名推断 MIME 类型
    pub async fn from_path(path: &std::path::Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let mime_type = mime_from_extension(path);
        let mut input = Self::new(bytes, mime_type);
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            input.file_name = Some(name.to_string());
        }
        Ok(input)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type
            .trim()
            .to_ascii_lowercase()
            .starts_with("image/")
    }
}

fn mime_from_extension(path: &std::path::Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_detection() {
        let catalog = LanguageCatalog::fallback();

        let detected = DetectionResult::new("fr", Some(0.92));
        assert_eq!(detected.describe(&catalog), "French (92%)");

        let no_confidence = DetectionResult::new("vi", None);
        assert_eq!(no_confidence.describe(&catalog), "Vietnamese");

        let unknown = DetectionResult::new("xx", Some(0.5));
        assert_eq!(unknown.describe(&catalog), "xx (50%)");
    }

    #[test]
    fn test_detection_json_contract() {
        let parsed: DetectionResult =
            serde_json::from_str(r#"{"lang":"fr","confidence":0.92}"#).unwrap();
        assert_eq!(parsed, DetectionResult::new("fr", Some(0.92)));

        let bare: DetectionResult = serde_json::from_str(r#"{"lang":"ja"}"#).unwrap();
        assert_eq!(bare.confidence, None);
    }

    #[test]
    fn test_image_type_declaration() {
        assert!(ImageInput::new(vec![1, 2, 3], "image/png").is_image());
        assert!(ImageInput::new(vec![1], " IMAGE/JPEG").is_image());
        assert!(!ImageInput::new(vec![1], "application/pdf").is_image());
        assert!(!ImageInput::new(vec![1], "").is_image());
    }

    #[test]
    fn test_mime_from_extension() {
        use std::path::Path;
        assert_eq!(mime_from_extension(Path::new("scan.PNG")), "image/png");
        assert_eq!(mime_from_extension(Path::new("notes.txt")), "text/plain");
        assert_eq!(
            mime_from_extension(Path::new("no_extension")),
            "application/octet-stream"
        );
    }
}
