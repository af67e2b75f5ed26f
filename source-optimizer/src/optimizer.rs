use crate::discovery::CandidateDiscovery;
use crate::feed_manager::SourceManager;
use crate::types::SourceMetrics;
use serde::Serialize;
use tracing::{debug, info};

/// What one maintenance cycle did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CycleSummary {
    pub evicted: Vec<String>,
    pub admitted: Vec<String>,
    pub rejected: Vec<String>,
    pub persisted: bool,
}

/// Eviction, discovery, admission and persistence, in that order.
pub struct OptimizationPolicy {
    discovery: CandidateDiscovery,
}

impl OptimizationPolicy {
    pub fn new(discovery: CandidateDiscovery) -> Self {
        Self { discovery }
    }

    /// A source goes only when it is below both thresholds.
    pub fn should_evict(metrics: &SourceMetrics, engagement_threshold: f64, relevance_threshold: f64) -> bool {
        metrics.engagement_rate < engagement_threshold
            && metrics.avg_relevance_score < relevance_threshold
    }

    pub fn select_evictions(&self, manager: &SourceManager) -> Vec<String> {
        let config = manager.config();
        manager
            .store()
            .iter()
            .filter(|m| Self::should_evict(m, config.engagement_threshold, config.relevance_threshold))
            .map(|m| m.name.clone())
            .collect()
    }

    /// Run one cycle. Per-source failures are logged and skipped; the cycle
    /// itself never fails.
    pub async fn run_cycle(&self, manager: &mut SourceManager) -> CycleSummary {
        let mut summary = CycleSummary::default();

        for name in self.select_evictions(manager) {
            if manager.remove_source(&name) {
                summary.evicted.push(name);
            }
        }

        if manager.has_capacity() {
            let candidates = self.discovery.discover(manager.registry()).await;
            debug!("Discovered {} candidate sources", candidates.len());

            for candidate in candidates {
                if !manager.has_capacity() {
                    break;
                }
                if manager.add_source(&candidate.name, &candidate.endpoint).await {
                    summary.admitted.push(candidate.name);
                } else {
                    summary.rejected.push(candidate.name);
                }
            }
        }

        summary.persisted = manager.save_metrics();

        info!(
            evicted = summary.evicted.len(),
            admitted = summary.admitted.len(),
            rejected = summary.rejected.len(),
            persisted = summary.persisted,
            sources = manager.registry().len(),
            "Maintenance cycle finished"
        );
        summary
    }
}

impl Default for OptimizationPolicy {
    fn default() -> Self {
        Self::new(CandidateDiscovery::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(engagement: f64, relevance: f64) -> SourceMetrics {
        let mut m = SourceMetrics::new("s", "https://s.example/feed");
        m.engagement_rate = engagement;
        m.avg_relevance_score = relevance;
        m
    }

    #[test]
    fn eviction_requires_both_thresholds() {
        assert!(!OptimizationPolicy::should_evict(&metrics(0.2, 0.6), 0.3, 0.5));
        assert!(!OptimizationPolicy::should_evict(&metrics(0.4, 0.1), 0.3, 0.5));
        assert!(OptimizationPolicy::should_evict(&metrics(0.2, 0.4), 0.3, 0.5));
    }

    #[test]
    fn thresholds_are_strict() {
        assert!(!OptimizationPolicy::should_evict(&metrics(0.3, 0.4), 0.3, 0.5));
        assert!(!OptimizationPolicy::should_evict(&metrics(0.2, 0.5), 0.3, 0.5));
    }
}
