#![allow(dead_code)]

use async_trait::async_trait;
use source_optimizer::{
    FeedFetcher, FeedItem, OptimizerConfig, OptimizerError, Result, SourceManager,
};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

static TRACING: Once = Once::new();

pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

enum Served {
    Items(Vec<FeedItem>),
    Down,
}

/// In-memory fetcher. Endpoints it was never told about answer with an
/// empty feed.
#[derive(Default)]
pub struct MockFetcher {
    feeds: Mutex<HashMap<String, Served>>,
    calls: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn serve(&self, endpoint: &str, items: Vec<FeedItem>) {
        self.feeds
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Served::Items(items));
    }

    pub fn take_down(&self, endpoint: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), Served::Down);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FeedFetcher for MockFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<FeedItem>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.feeds.lock().unwrap().get(endpoint) {
            Some(Served::Items(items)) => Ok(items.clone()),
            Some(Served::Down) => Err(OptimizerError::General(format!(
                "connection refused: {}",
                endpoint
            ))),
            None => Ok(Vec::new()),
        }
    }
}

pub fn item(title: &str) -> FeedItem {
    FeedItem {
        title: title.to_string(),
        link: format!("https://news.example/{}", title.replace(' ', "-")),
        summary: format!("{} summary", title),
        ..FeedItem::default()
    }
}

pub fn items(count: usize) -> Vec<FeedItem> {
    (0..count).map(|i| item(&format!("story {}", i))).collect()
}

pub fn endpoint(name: &str) -> String {
    format!("https://{}.example/feed.xml", name)
}

pub fn config_in(dir: &Path) -> OptimizerConfig {
    OptimizerConfig {
        metrics_path: dir.join("source_metrics.json"),
        ..OptimizerConfig::default()
    }
}

pub fn manager_in(dir: &Path, fetcher: Arc<MockFetcher>) -> SourceManager {
    SourceManager::new(config_in(dir), fetcher)
}

/// Registers every name against a live mock feed and adds it.
pub async fn add_live(manager: &mut SourceManager, fetcher: &MockFetcher, names: &[&str]) {
    for name in names {
        let url = endpoint(name);
        fetcher.serve(&url, items(3));
        assert!(manager.add_source(name, &url).await, "could not add {}", name);
    }
}

pub fn assert_keys_match(manager: &SourceManager) {
    let registry: Vec<&str> = manager.registry().names().collect();
    let store: Vec<&str> = manager.store().names().collect();
    assert_eq!(registry, store);
}
