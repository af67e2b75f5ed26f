use crate::feed_manager::SourceManager;
use crate::rss_utils::time::within_days;
use crate::types::{LiveSourceSpec, SourceMetrics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;

/// Order by `(engagement_rate, avg_relevance_score)`, highest first.
///
/// The sort is stable, so exact ties keep the order of the input iterator
/// (name order for the store). Nothing else breaks ties.
pub fn rank_sources<'a, I>(metrics: I) -> Vec<&'a SourceMetrics>
where
    I: IntoIterator<Item = &'a SourceMetrics>,
{
    let mut ranked: Vec<&SourceMetrics> = metrics.into_iter().collect();
    ranked.sort_by(|a, b| compare_rank(b, a));
    ranked
}

fn compare_rank(a: &SourceMetrics, b: &SourceMetrics) -> Ordering {
    a.engagement_rate
        .total_cmp(&b.engagement_rate)
        .then_with(|| a.avg_relevance_score.total_cmp(&b.avg_relevance_score))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceReport {
    pub total_sources: usize,
    pub active_sources: usize,
    pub total_articles_processed: u64,
    pub total_relevant_articles: u64,
    pub overall_relevance_rate: f64,
    pub top_performing_sources: Vec<LiveSourceSpec>,
    /// Sources whose metrics were touched inside the recent window. Any
    /// update refreshes `last_updated`, so this tracks activity rather than
    /// admission.
    pub recent_additions: Vec<String>,
}

impl SourceManager {
    /// The `limit` best sources as name/endpoint pairs, best first.
    pub fn get_top_sources(&self, limit: usize) -> Vec<LiveSourceSpec> {
        rank_sources(self.store().iter())
            .into_iter()
            .filter_map(|m| {
                self.registry()
                    .endpoint(&m.name)
                    .map(|endpoint| LiveSourceSpec::new(m.name.as_str(), endpoint))
            })
            .take(limit)
            .collect()
    }

    pub fn get_performance_report(&self) -> PerformanceReport {
        self.performance_report_at(Utc::now())
    }

    pub fn performance_report_at(&self, now: DateTime<Utc>) -> PerformanceReport {
        let store = self.store();
        let total_articles: u64 = store.iter().map(|m| m.total_articles).sum();
        let total_relevant: u64 = store.iter().map(|m| m.relevant_articles).sum();

        let overall_relevance_rate = if total_articles > 0 {
            total_relevant as f64 / total_articles as f64
        } else {
            0.0
        };

        let window = self.config().recent_window_days;
        let recent_additions = store
            .iter()
            .filter(|m| m.last_updated.is_some_and(|ts| within_days(ts, now, window)))
            .map(|m| m.name.clone())
            .collect();

        PerformanceReport {
            total_sources: self.registry().len(),
            active_sources: store.iter().filter(|m| m.is_active).count(),
            total_articles_processed: total_articles,
            total_relevant_articles: total_relevant,
            overall_relevance_rate,
            top_performing_sources: self.get_top_sources(self.config().report_top_sources),
            recent_additions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(name: &str, engagement: f64, relevance: f64) -> SourceMetrics {
        let mut m = SourceMetrics::new(name, format!("https://{}.example/feed", name));
        m.engagement_rate = engagement;
        m.avg_relevance_score = relevance;
        m
    }

    #[test]
    fn secondary_key_breaks_primary_ties() {
        let all = vec![
            metrics("a", 0.8, 0.9),
            metrics("b", 0.8, 0.95),
            metrics("c", 0.1, 0.99),
        ];
        let names: Vec<_> = rank_sources(&all).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a", "c"]);
    }

    #[test]
    fn exact_ties_keep_input_order() {
        let all = vec![metrics("x", 0.5, 0.5), metrics("y", 0.5, 0.5)];
        let names: Vec<_> = rank_sources(&all).iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
    }
}
