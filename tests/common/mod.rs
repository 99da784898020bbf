// 集成测试公共模块
//
// 提供可记录调用、可控制延迟的服务替身和测试环境

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use geasy_translate::translation::config::OrchestratorConfig;
use geasy_translate::translation::core::{Orchestrator, TranslatorState};
use geasy_translate::translation::error::{TranslatorError, TranslatorResult};
use geasy_translate::translation::providers::{
    DetectionResult, ExtractionResult, ImageInput, Language, LanguageDetector, OcrExtractor,
    TranslationProvider,
};

/// 一次翻译调用 (source_lang, target_lang, text)
pub type TranslateCall = (String, String, String);

/// 翻译服务替身
///
/// 默认返回 `"[target] text"`，可以按原文指定译文、失败和延迟。
#[derive(Default)]
pub struct MockTranslator {
    calls: Mutex<Vec<TranslateCall>>,
    responses: Mutex<HashMap<String, String>>,
    failures: Mutex<HashMap<String, TranslatorError>>,
    delays: Mutex<HashMap<String, Duration>>,
    languages: Mutex<Option<Vec<Language>>>,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, text: &str, translation: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(text.to_string(), translation.to_string());
        self
    }

    pub fn with_failure(self, text: &str, error: TranslatorError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(text.to_string(), error);
        self
    }

    pub fn with_delay(self, text: &str, delay: Duration) -> Self {
        self.delays
            .lock()
            .unwrap()
            .insert(text.to_string(), delay);
        self
    }

    pub fn with_languages(self, languages: Vec<Language>) -> Self {
        *self.languages.lock().unwrap() = Some(languages);
        self
    }

    pub fn calls(&self) -> Vec<TranslateCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls().into_iter().map(|(_, _, text)| text).collect()
    }
}

#[async_trait]
impl TranslationProvider for MockTranslator {
    async fn translate(
        &self,
        source_lang: &str,
        target_lang: &str,
        text: &str,
    ) -> TranslatorResult<String> {
        self.calls.lock().unwrap().push((
            source_lang.to_string(),
            target_lang.to_string(),
            text.to_string(),
        ));

        let delay = self.delays.lock().unwrap().get(text).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.lock().unwrap().get(text).cloned() {
            return Err(error);
        }

        let response = self.responses.lock().unwrap().get(text).cloned();
        Ok(response.unwrap_or_else(|| format!("[{}] {}", target_lang, text)))
    }

    async fn languages(&self) -> TranslatorResult<Vec<Language>> {
        self.languages
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| TranslatorError::Network("languages endpoint unavailable".into()))
    }
}

/// 语言检测替身
///
/// 按调用次数轮流返回预设结果。
pub struct MockDetector {
    results: Vec<TranslatorResult<DetectionResult>>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
}

impl MockDetector {
    pub fn returning(lang: &str, confidence: Option<f64>) -> Self {
        Self::alternating(&[lang], confidence)
    }

    /// 每次检测换一种语言，保证源语言总会被改写
    pub fn alternating(langs: &[&str], confidence: Option<f64>) -> Self {
        Self {
            results: langs
                .iter()
                .map(|lang| Ok(DetectionResult::new(*lang, confidence)))
                .collect(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: TranslatorError) -> Self {
        Self {
            results: vec![Err(error)],
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl LanguageDetector for MockDetector {
    async fn detect(&self, text: &str) -> TranslatorResult<DetectionResult> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(text.to_string());
            (calls.len() - 1) % self.results.len()
        };
        tokio::time::sleep(self.delay).await;
        self.results[index].clone()
    }
}

/// 文字提取替身，只统计真正的 extract 调用
pub struct MockExtractor {
    result: Mutex<TranslatorResult<ExtractionResult>>,
    calls: AtomicUsize,
}

impl MockExtractor {
    pub fn returning(text: &str) -> Self {
        Self {
            result: Mutex::new(Ok(ExtractionResult {
                text: text.to_string(),
                success: true,
            })),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: TranslatorError) -> Self {
        Self {
            result: Mutex::new(Err(error)),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrExtractor for MockExtractor {
    async fn extract(
        &self,
        _image: &ImageInput,
        _language_hint: &str,
    ) -> TranslatorResult<ExtractionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.result.lock().unwrap().clone()
    }
}

/// 测试环境：编排器加上三个替身
pub struct TestEnvironment {
    pub orchestrator: Orchestrator,
    pub translator: Arc<MockTranslator>,
    pub detector: Arc<MockDetector>,
    pub extractor: Arc<MockExtractor>,
}

impl TestEnvironment {
    pub fn new(translator: MockTranslator) -> Self {
        Self::with_parts(
            test_config(),
            translator,
            MockDetector::returning("en", Some(0.99)),
            MockExtractor::returning("Text from image"),
        )
    }

    pub fn with_parts(
        config: OrchestratorConfig,
        translator: MockTranslator,
        detector: MockDetector,
        extractor: MockExtractor,
    ) -> Self {
        let translator = Arc::new(translator);
        let detector = Arc::new(detector);
        let extractor = Arc::new(extractor);

        let orchestrator = Orchestrator::new(
            config,
            detector.clone(),
            translator.clone(),
            extractor.clone(),
        )
        .expect("test config should be valid");

        Self {
            orchestrator,
            translator,
            detector,
            extractor,
        }
    }

    pub fn state(&self) -> TranslatorState {
        self.orchestrator.state()
    }
}

/// en→vi，默认防抖和缓存参数
pub fn test_config() -> OrchestratorConfig {
    OrchestratorConfig::default_with_langs("en", "vi")
}

pub fn png() -> ImageInput {
    ImageInput::new(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a], "image/png").with_file_name("scan.png")
}

/// 长度超过检测门槛的文本
pub fn long_text(len: usize) -> String {
    "Bonjour le monde ".chars().cycle().take(len).collect()
}

/// 在暂停时钟下推进时间并让出执行权
pub async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}
