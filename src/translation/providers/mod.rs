//! 外部服务模块
//!
//! 语言检测、翻译、图片文字提取三类服务都以 trait 形式暴露，
//! 调度器只依赖 trait，HTTP 实现和测试替身可以互换。

pub mod detector;
pub mod languages;
pub mod ocr;
pub mod translator;
pub mod types;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;

use crate::translation::error::{helpers, TranslatorError, TranslatorResult};

pub use detector::HttpLanguageDetector;
pub use languages::{LanguageCatalog, FALLBACK_LANGUAGES};
pub use ocr::{ocr_language_hint, OcrSpaceExtractor};
pub use translator::LingvaTranslator;
pub use types::{DetectionResult, ExtractionResult, ImageInput, Language};

/// 语言检测服务
#[async_trait]
pub trait LanguageDetector: Send + Sync {
    async fn detect(&self, text: &str) -> TranslatorResult<DetectionResult>;
}

/// 翻译服务
#[async_trait]
pub trait TranslationProvider: Send + Sync {
    async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> TranslatorResult<String>;

    /// 服务支持的语言列表
    async fn languages(&self) -> TranslatorResult<Vec<Language>>;
}

/// 图片文字提取服务
#[async_trait]
pub trait OcrExtractor: Send + Sync {
    /// 同步校验输入，不发起任何请求
    fn validate(&self, image: &ImageInput) -> TranslatorResult<()> {
        validate_image(image)
    }

    /// `language_hint` 为应用内语言代码，由实现自行映射
    async fn extract(
        &self,
        image: &ImageInput,
        language_hint: &str,
    ) -> TranslatorResult<ExtractionResult>;
}

/// 非图片类型或空内容返回 `Validation`
pub fn validate_image(image: &ImageInput) -> TranslatorResult<()> {
    if !image.is_image() {
        return Err(helpers::validation_error(format!(
            "不支持的文件类型 '{}'，请选择图片文件",
            image.mime_type
        )));
    }

    if image.bytes.is_empty() {
        return Err(helpers::validation_error("图片内容为空"));
    }

    Ok(())
}

/// 给服务调用加上超时，超时按网络错误处理
pub async fn with_timeout<T, F>(timeout: Duration, future: F) -> TranslatorResult<T>
where
    F: Future<Output = TranslatorResult<T>>,
{
    tokio::time::timeout(timeout, future).await?
}

pub(crate) fn build_http_client() -> TranslatorResult<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("geasy-translate/", env!("CARGO_PKG_VERSION")))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| helpers::config_error(format!("创建 HTTP 客户端失败: {}", e)))
}

/// 非 2xx 响应统一转为 `Provider`
pub(crate) async fn ensure_success(response: reqwest::Response) -> TranslatorResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(helpers::provider_error(format!(
        "HTTP {}: {}",
        status,
        body.chars().take(200).collect::<String>()
    )))
}

/// 返回固定响应的本地 HTTP 服务，供客户端测试使用
#[cfg(test)]
pub(crate) mod test_server {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    /// 不走系统代理的客户端
    pub fn client() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// 启动服务并返回 `http://127.0.0.1:port`
    pub async fn serve(status: u16, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                tokio::spawn(async move {
                    read_request(&mut stream).await;
                    let response = format!(
                        "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{}", addr)
    }

    /// 读完整个请求再应答，上传的请求体不会被截断
    async fn read_request(stream: &mut TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let header_end = loop {
            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let headers = String::from_utf8_lossy(&buf[..header_end]).to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|value| value.trim().parse::<usize>().ok());
        let chunked = headers.contains("transfer-encoding: chunked");

        loop {
            let body = &buf[header_end..];
            let complete = match content_length {
                Some(len) => body.len() >= len,
                None if chunked => body.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if complete {
                return;
            }

            let n = stream.read(&mut chunk).await.unwrap_or(0);
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
        }
    }
}
