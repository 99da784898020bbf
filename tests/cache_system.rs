//! 缓存系统集成测试
//!
//! 测试缓存与调度器的写回、定时清理、容量上限和并发访问

use std::sync::Arc;
use std::time::Duration;

use geasy_translate::translation::config::OrchestratorConfig;
use geasy_translate::translation::storage::{CacheConfig, TranslationCache};

mod common {
    #![allow(dead_code)]
    include!("common/mod.rs");
}

use common::{advance, test_config, MockDetector, MockExtractor, MockTranslator, TestEnvironment};

#[tokio::test(start_paused = true)]
async fn test_cache_round_trip_within_ttl() {
    let cache = TranslationCache::new();
    cache.put("en", "vi", "hello", "xin chào");

    tokio::time::advance(Duration::from_secs(29 * 60)).await;
    assert_eq!(cache.get("en", "vi", "hello"), Some("xin chào".to_string()));

    tokio::time::advance(Duration::from_secs(2 * 60)).await;
    assert_eq!(cache.get("en", "vi", "hello"), None);
}

#[tokio::test(start_paused = true)]
async fn test_overwrite_replaces_value_and_refreshes_window() {
    let cache = TranslationCache::new();
    cache.put("en", "vi", "hello", "chào");

    tokio::time::advance(Duration::from_secs(20 * 60)).await;
    cache.put("en", "vi", "hello", "xin chào");

    tokio::time::advance(Duration::from_secs(20 * 60)).await;
    assert_eq!(cache.get("en", "vi", "hello"), Some("xin chào".to_string()));
}

#[tokio::test(start_paused = true)]
async fn test_expired_entry_triggers_new_request() {
    let config = OrchestratorConfig {
        cache_ttl_secs: 60,
        ..test_config()
    };
    let env = TestEnvironment::with_parts(
        config,
        MockTranslator::new(),
        MockDetector::returning("en", None),
        MockExtractor::returning(""),
    );

    env.orchestrator.on_text_change("again");
    env.orchestrator.settled().await;
    env.orchestrator.on_text_change("");

    advance(61_000).await;
    env.orchestrator.on_text_change("again");
    env.orchestrator.settled().await;

    assert_eq!(env.translator.call_count(), 2);
    assert_eq!(env.orchestrator.stats().cache_hits, 0);
}

#[tokio::test(start_paused = true)]
async fn test_orchestrator_sweeps_unread_entries() {
    let config = OrchestratorConfig {
        cache_ttl_secs: 60,
        sweep_interval_secs: 120,
        ..test_config()
    };
    let env = TestEnvironment::with_parts(
        config,
        MockTranslator::new(),
        MockDetector::returning("en", None),
        MockExtractor::returning(""),
    );

    env.orchestrator.on_text_change("written once");
    env.orchestrator.settled().await;
    assert_eq!(env.orchestrator.cache().len(), 1);

    advance(121_000).await;
    let stats = env.orchestrator.cache_stats();
    assert_eq!(stats.total_entries, 0);
    assert!(stats.sweeps >= 1);
    assert_eq!(stats.expirations, 1);
}

#[tokio::test(start_paused = true)]
async fn test_configured_size_bound() {
    let config = OrchestratorConfig {
        cache_max_entries: Some(2),
        ..test_config()
    };
    let env = TestEnvironment::with_parts(
        config,
        MockTranslator::new(),
        MockDetector::returning("en", None),
        MockExtractor::returning(""),
    );

    for text in ["one", "two", "three"] {
        env.orchestrator.on_text_change(text);
        env.orchestrator.settled().await;
    }

    let cache = env.orchestrator.cache();
    assert_eq!(cache.len(), 2);
    assert!(!cache.contains("en", "vi", "one"));
    assert!(cache.contains("en", "vi", "three"));
    assert_eq!(cache.get_stats().evictions, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_access() {
    let cache = Arc::new(TranslationCache::with_config(CacheConfig {
        ttl: Duration::from_secs(600),
        max_entries: Some(64),
    }));

    let mut handles = Vec::new();
    for worker in 0..8 {
        let cache = Arc::clone(&cache);
        handles.push(tokio::spawn(async move {
            for i in 0..100 {
                let text = format!("text-{}", i % 32);
                cache.put("en", "vi", &text, &format!("{}-{}", worker, i));
                assert!(cache.get("en", "vi", &text).is_some());
                if i % 25 == 0 {
                    cache.sweep();
                }
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    assert_eq!(cache.len(), 32);
    let stats = cache.get_stats();
    assert_eq!(stats.cache_hits, 800);
    assert_eq!(stats.evictions, 0);
}
