//! 模拟一次打字会话
//!
//! 用本地的假翻译服务演示防抖合并、缓存命中和语言交换，不访问网络。

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geasy_translate::translation::config::OrchestratorConfig;
use geasy_translate::translation::providers::{
    DetectionResult, ExtractionResult, ImageInput, Language, LanguageDetector, OcrExtractor,
    TranslationProvider,
};
use geasy_translate::translation::{Orchestrator, TranslatorResult};

/// 把文本倒序作为"译文"
struct ReverseTranslator;

#[async_trait]
impl TranslationProvider for ReverseTranslator {
    async fn translate(&self, _: &str, _: &str, text: &str) -> TranslatorResult<String> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(text.chars().rev().collect())
    }

    async fn languages(&self) -> TranslatorResult<Vec<Language>> {
        Ok(vec![Language::new("en", "English"), Language::new("vi", "Vietnamese")])
    }
}

struct EnglishDetector;

#[async_trait]
impl LanguageDetector for EnglishDetector {
    async fn detect(&self, _: &str) -> TranslatorResult<DetectionResult> {
        Ok(DetectionResult::new("en", Some(0.97)))
    }
}

struct NoOcr;

#[async_trait]
impl OcrExtractor for NoOcr {
    async fn extract(&self, _: &ImageInput, _: &str) -> TranslatorResult<ExtractionResult> {
        Ok(ExtractionResult {
            text: String::new(),
            success: false,
        })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let orchestrator = Orchestrator::new(
        OrchestratorConfig::default(),
        Arc::new(EnglishDetector),
        Arc::new(ReverseTranslator),
        Arc::new(NoOcr),
    )?;

    // 每 80ms 一次按键，只会发出一次请求
    let sentence = "Hello world";
    for end in 1..=sentence.len() {
        orchestrator.on_text_change(&sentence[..end]);
        tokio::time::sleep(Duration::from_millis(80)).await;
    }

    let state = orchestrator.settled().await;
    println!("{} → {}", state.source_text, state.translated_text);

    orchestrator.swap_languages();
    let state = orchestrator.settled().await;
    println!("swapped ({}→{}): {} → {}", state.source_lang, state.target_lang, state.source_text, state.translated_text);

    let stats = orchestrator.stats();
    println!(
        "dispatches: {}, cache hits: {}, stale discarded: {}",
        stats.dispatches, stats.cache_hits, stats.stale_discarded
    );

    Ok(())
}
