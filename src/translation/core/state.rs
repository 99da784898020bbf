//! 可观察状态
//!
//! UI 层只读这里的快照，或通过 `subscribe()` 等待变化。
//! 所有写入都经过 `StateHandle::update`，在 watch 通道内原子完成。

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::translation::error::TranslatorError;
use crate::translation::providers::DetectionResult;

/// 输入模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    #[default]
    Text,
    Image,
}

/// 翻译器的可观察状态
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TranslatorState {
    pub source_text: String,
    pub translated_text: String,
    pub source_lang: String,
    pub target_lang: String,
    pub detected_language: Option<DetectionResult>,
    pub is_translating: bool,
    pub is_detecting: bool,
    pub is_extracting: bool,
    /// 最近一次对用户可见的错误
    pub error: Option<TranslatorError>,
    pub mode: TranslationMode,
    pub has_image: bool,
}

impl TranslatorState {
    pub fn new(source_lang: &str, target_lang: &str) -> Self {
        Self {
            source_lang: source_lang.to_string(),
            target_lang: target_lang.to_string(),
            ..Self::default()
        }
    }

    /// 是否有任何请求在进行中
    pub fn is_busy(&self) -> bool {
        self.is_translating || self.is_detecting || self.is_extracting
    }
}

/// 状态句柄，克隆后共享同一份状态
#[derive(Debug, Clone)]
pub struct StateHandle {
    tx: Arc<watch::Sender<TranslatorState>>,
}

impl StateHandle {
    pub fn new(initial: TranslatorState) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    /// 修改状态并通知订阅者
    pub fn update<F>(&self, modify: F)
    where
        F: FnOnce(&mut TranslatorState),
    {
        self.tx.send_modify(modify);
    }

    /// 条件修改，闭包返回 false 时不通知订阅者
    pub fn update_if<F>(&self, modify: F) -> bool
    where
        F: FnOnce(&mut TranslatorState) -> bool,
    {
        self.tx.send_if_modified(modify)
    }

    pub fn snapshot(&self) -> TranslatorState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<TranslatorState> {
        self.tx.subscribe()
    }
}
