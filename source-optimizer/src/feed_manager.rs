use crate::metrics_store::{LoadReport, MetricsStore};
use crate::registry::SourceRegistry;
use crate::rss_utils::url::{extract_domain, validate_feed_url};
use crate::traits::FeedFetcher;
use crate::types::{EngagementAction, OptimizerConfig, OptimizerError, Result, SourceMetrics};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Owns the registry and the metrics store and keeps their key sets equal.
///
/// There is no internal locking: callers serialise mutations (one fetch or
/// maintenance cycle at a time).
pub struct SourceManager {
    registry: SourceRegistry,
    store: MetricsStore,
    fetcher: Arc<dyn FeedFetcher>,
    config: OptimizerConfig,
}

impl SourceManager {
    /// Empty manager. Call `load()` or use `bootstrap()` to pick up saved state.
    pub fn new(config: OptimizerConfig, fetcher: Arc<dyn FeedFetcher>) -> Self {
        let store = MetricsStore::new(config.metrics_path.clone());
        Self {
            registry: SourceRegistry::new(),
            store,
            fetcher,
            config,
        }
    }

    /// Load saved metrics, then probe and add any default seed not yet tracked.
    pub async fn bootstrap(config: OptimizerConfig, fetcher: Arc<dyn FeedFetcher>) -> Self {
        let mut manager = Self::new(config, fetcher);
        manager.load();
        manager.seed_default_sources().await;
        manager
    }

    /// Reload the metrics store from disk and rebuild the registry from it.
    pub fn load(&mut self) -> LoadReport {
        let report = self.store.load();
        self.registry = SourceRegistry::from_metrics(&self.store);
        report
    }

    /// Returns how many seeds were admitted.
    pub async fn seed_default_sources(&mut self) -> usize {
        let mut added = 0;
        for seed in SourceRegistry::default_seeds() {
            if self.store.contains(&seed.name) {
                continue;
            }
            if !self.has_capacity() {
                debug!("Registry full, not seeding {}", seed.name);
                break;
            }
            if self.add_source(&seed.name, &seed.uri).await {
                added += 1;
            }
        }
        added
    }

    /// Probe `endpoint` and, if it yields at least one item, track it under
    /// `name`. Re-adding a known name overwrites its endpoint and metrics.
    ///
    /// Failures are logged and leave all state untouched.
    pub async fn add_source(&mut self, name: &str, endpoint: &str) -> bool {
        match self.try_add_source(name, endpoint).await {
            Ok(items) => {
                info!(
                    source = %name,
                    domain = extract_domain(endpoint).as_deref().unwrap_or("?"),
                    items,
                    "Added new source"
                );
                true
            }
            Err(OptimizerError::EmptyFeed { .. }) => {
                warn!(source = %name, endpoint = %endpoint, "Invalid feed, probe returned no items");
                false
            }
            Err(e) => {
                error!(source = %name, endpoint = %endpoint, "Error adding source: {}", e);
                false
            }
        }
    }

    /// Same as `add_source` but hands back the reason for a rejection.
    /// On success returns the number of items the probe saw.
    pub async fn try_add_source(&mut self, name: &str, endpoint: &str) -> Result<usize> {
        if name.trim().is_empty() {
            return Err(OptimizerError::General("source name must not be empty".to_string()));
        }
        validate_feed_url(endpoint)?;

        let items = self.fetcher.fetch(endpoint).await?;
        if items.is_empty() {
            return Err(OptimizerError::EmptyFeed {
                url: endpoint.to_string(),
            });
        }

        self.registry.insert(name, endpoint);
        self.store.insert(SourceMetrics::new(name, endpoint));
        Ok(items.len())
    }

    /// Drop a source from both the registry and the store. Absent names are
    /// a no-op. Returns whether anything was removed.
    pub fn remove_source(&mut self, name: &str) -> bool {
        let in_registry = self.registry.remove(name).is_some();
        let in_store = self.store.remove(name).is_some();
        if in_registry || in_store {
            info!(source = %name, "Removed source");
        }
        in_registry || in_store
    }

    pub fn update_metrics(
        &mut self,
        name: &str,
        article_count: u64,
        relevant_count: u64,
        avg_score: f64,
    ) -> bool {
        self.store
            .update_metrics(name, article_count, relevant_count, avg_score)
    }

    pub fn record_user_engagement(&mut self, name: &str, action: EngagementAction) -> bool {
        self.store.record_user_engagement(name, action)
    }

    /// Persist the store. A failure is logged; in-memory state stays
    /// authoritative and the next successful save catches up.
    pub fn save_metrics(&self) -> bool {
        match self.store.save() {
            Ok(()) => true,
            Err(e) => {
                error!("Error saving metrics to {}: {}", self.store.path().display(), e);
                false
            }
        }
    }

    pub fn has_capacity(&self) -> bool {
        self.registry.len() < self.config.max_sources
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn store(&self) -> &MetricsStore {
        &self.store
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn fetcher(&self) -> Arc<dyn FeedFetcher> {
        Arc::clone(&self.fetcher)
    }
}
