use crate::metrics_store::MetricsStore;
use crate::types::LiveSourceSpec;
use std::collections::BTreeMap;

/// Bootstrap feeds tried on first start.
const DEFAULT_SEEDS: &[(&str, &str)] = &[
    ("tech_crunch", "https://techcrunch.com/feed/"),
    ("venture_beat", "https://venturebeat.com/feed/"),
    ("wired", "https://www.wired.com/feed/rss"),
    ("arstechnica", "https://feeds.arstechnica.com/arstechnica/index"),
    ("the_verge", "https://www.theverge.com/rss/index.xml"),
    ("mit_tech_review", "https://www.technologyreview.com/feed/"),
    ("ieee_spectrum", "https://spectrum.ieee.org/rss"),
    (
        "science_daily",
        "https://www.sciencedaily.com/rss/computers_math/artificial_intelligence.xml",
    ),
];

/// Name -> fetch endpoint for every tracked source.
///
/// Only `SourceManager` mutates it, always together with the metrics store.
#[derive(Debug, Clone, Default)]
pub struct SourceRegistry {
    sources: BTreeMap<String, String>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn default_seeds() -> Vec<LiveSourceSpec> {
        DEFAULT_SEEDS
            .iter()
            .map(|(name, uri)| LiveSourceSpec::new(*name, *uri))
            .collect()
    }

    /// Rebuild from loaded metrics so both key sets start out equal.
    pub(crate) fn from_metrics(store: &MetricsStore) -> Self {
        Self {
            sources: store
                .iter()
                .map(|m| (m.name.clone(), m.endpoint.clone()))
                .collect(),
        }
    }

    pub(crate) fn insert(&mut self, name: &str, endpoint: &str) -> Option<String> {
        self.sources.insert(name.to_string(), endpoint.to_string())
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<String> {
        self.sources.remove(name)
    }

    pub fn endpoint(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.sources.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn seeds_have_unique_names_and_http_endpoints() {
        let seeds = SourceRegistry::default_seeds();
        assert_eq!(seeds.len(), 8);
        let names: HashSet<_> = seeds.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names.len(), seeds.len());
        assert!(seeds.iter().all(|s| s.uri.starts_with("https://")));
    }

    #[test]
    fn insert_overwrites_endpoint() {
        let mut registry = SourceRegistry::new();
        assert_eq!(registry.insert("wired", "https://a.example/feed"), None);
        assert_eq!(
            registry.insert("wired", "https://b.example/feed"),
            Some("https://a.example/feed".to_string())
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.endpoint("wired"), Some("https://b.example/feed"));
    }
}
