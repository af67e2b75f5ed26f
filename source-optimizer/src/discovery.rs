//! Candidate discovery.
//!
//! Only the curated list produces candidates. The directory and aggregator
//! providers are extension points that currently return nothing.

use crate::registry::SourceRegistry;
use crate::types::LiveSourceSpec;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

const CURATED_SOURCES: &[(&str, &str)] = &[
    ("hacker_news", "https://news.ycombinator.com/rss"),
    ("slashdot", "https://rss.slashdot.org/Slashdot/slashdotMain"),
    ("engadget", "https://www.engadget.com/rss.xml"),
    ("gizmodo", "https://gizmodo.com/rss"),
    ("tech_radar", "https://www.techradar.com/rss"),
    ("zdnet", "https://www.zdnet.com/news/rss.xml"),
    ("cnet", "https://www.cnet.com/rss/all/"),
    ("tech_republic", "https://www.techrepublic.com/rssfeeds/articles/"),
    ("information_week", "https://www.informationweek.com/rss_simple.asp"),
    ("computer_world", "https://www.computerworld.com/index.rss"),
    ("ai_news", "https://artificialintelligence-news.com/feed/"),
    ("machine_learning_mastery", "https://machinelearningmastery.com/feed/"),
    ("deep_learning_ai", "https://www.deeplearning.ai/feed/"),
    ("google_ai_blog", "https://ai.googleblog.com/feeds/posts/default"),
    ("openai_blog", "https://openai.com/blog/rss.xml"),
    ("nvidia_ai", "https://blogs.nvidia.com/feed/"),
    ("microsoft_ai", "https://blogs.microsoft.com/ai/feed/"),
    ("aws_ai", "https://aws.amazon.com/blogs/machine-learning/feed/"),
    (
        "google_cloud_ai",
        "https://cloud.google.com/blog/products/ai-machine-learning/rss",
    ),
    ("ibm_watson", "https://www.ibm.com/blogs/watson/feed/"),
    ("stack_overflow_blog", "https://stackoverflow.blog/feed/"),
    ("github_blog", "https://github.blog/feed/"),
    ("dev_to", "https://dev.to/feed"),
    ("medium_programming", "https://medium.com/feed/tag/programming"),
    ("hashnode", "https://hashnode.com/rss"),
];

const RSS_DIRECTORIES: &[&str] = &[
    "https://feedly.com/i/discover/sources/search/feed/",
    "https://rss.com/blog/rss-feeds/",
];

const TECH_AGGREGATORS: &[&str] = &["https://alltop.com/technology", "https://techmeme.com/river"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoveryMethod {
    CuratedList,
    RssDirectory,
    TechAggregator,
}

impl fmt::Display for DiscoveryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CuratedList => f.write_str("curated_list"),
            Self::RssDirectory => f.write_str("rss_directory"),
            Self::TechAggregator => f.write_str("tech_aggregator"),
        }
    }
}

/// An unvetted `(name, endpoint)` pair; admission still has to probe it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateSource {
    pub name: String,
    pub endpoint: String,
    pub method: DiscoveryMethod,
}

/// One way of finding new sources.
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    fn method(&self) -> DiscoveryMethod;

    async fn candidates(&self) -> Vec<CandidateSource>;
}

/// Fixed, hand-picked list of tech feeds.
pub struct CuratedList {
    entries: Vec<LiveSourceSpec>,
}

impl CuratedList {
    pub fn new(entries: Vec<LiveSourceSpec>) -> Self {
        Self { entries }
    }
}

impl Default for CuratedList {
    fn default() -> Self {
        Self::new(
            CURATED_SOURCES
                .iter()
                .map(|(name, uri)| LiveSourceSpec::new(*name, *uri))
                .collect(),
        )
    }
}

#[async_trait]
impl CandidateProvider for CuratedList {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::CuratedList
    }

    async fn candidates(&self) -> Vec<CandidateSource> {
        self.entries
            .iter()
            .map(|spec| CandidateSource {
                name: spec.name.clone(),
                endpoint: spec.uri.clone(),
                method: self.method(),
            })
            .collect()
    }
}

/// Public RSS directories. Not scraped yet.
pub struct RssDirectories {
    directories: Vec<String>,
}

impl Default for RssDirectories {
    fn default() -> Self {
        Self {
            directories: RSS_DIRECTORIES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CandidateProvider for RssDirectories {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::RssDirectory
    }

    async fn candidates(&self) -> Vec<CandidateSource> {
        for directory in &self.directories {
            debug!("No scraper for RSS directory {}, skipping", directory);
        }
        Vec::new()
    }
}

/// Tech news aggregators. Not scraped yet.
pub struct TechAggregators {
    aggregators: Vec<String>,
}

impl Default for TechAggregators {
    fn default() -> Self {
        Self {
            aggregators: TECH_AGGREGATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[async_trait]
impl CandidateProvider for TechAggregators {
    fn method(&self) -> DiscoveryMethod {
        DiscoveryMethod::TechAggregator
    }

    async fn candidates(&self) -> Vec<CandidateSource> {
        for aggregator in &self.aggregators {
            debug!("No scraper for aggregator {}, skipping", aggregator);
        }
        Vec::new()
    }
}

/// Runs every provider in order and keeps candidates whose names are not
/// already registered. The first provider to name a source wins.
pub struct CandidateDiscovery {
    providers: Vec<Box<dyn CandidateProvider>>,
}

impl CandidateDiscovery {
    pub fn with_providers(providers: Vec<Box<dyn CandidateProvider>>) -> Self {
        Self { providers }
    }

    pub async fn discover(&self, registry: &SourceRegistry) -> Vec<CandidateSource> {
        let mut seen = HashSet::new();
        let mut found = Vec::new();

        for provider in &self.providers {
            let candidates = provider.candidates().await;
            debug!(
                method = %provider.method(),
                "Discovery provider returned {} candidates",
                candidates.len()
            );
            for candidate in candidates {
                if registry.contains(&candidate.name) || !seen.insert(candidate.name.clone()) {
                    continue;
                }
                found.push(candidate);
            }
        }

        found
    }
}

impl Default for CandidateDiscovery {
    fn default() -> Self {
        Self::with_providers(vec![
            Box::new(CuratedList::default()),
            Box::new(RssDirectories::default()),
            Box::new(TechAggregators::default()),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_providers_return_nothing() {
        assert!(RssDirectories::default().candidates().await.is_empty());
        assert!(TechAggregators::default().candidates().await.is_empty());
    }

    #[tokio::test]
    async fn curated_list_is_tagged_with_its_method() {
        let candidates = CuratedList::default().candidates().await;
        assert_eq!(candidates.len(), 25);
        assert!(candidates
            .iter()
            .all(|c| c.method == DiscoveryMethod::CuratedList));
    }

    #[tokio::test]
    async fn discover_skips_registered_and_repeated_names() {
        let mut registry = SourceRegistry::new();
        registry.insert("hacker_news", "https://news.ycombinator.com/rss");

        let discovery = CandidateDiscovery::with_providers(vec![
            Box::new(CuratedList::new(vec![
                LiveSourceSpec::new("hacker_news", "https://news.ycombinator.com/rss"),
                LiveSourceSpec::new("dev_to", "https://dev.to/feed"),
            ])),
            Box::new(CuratedList::new(vec![LiveSourceSpec::new(
                "dev_to",
                "https://mirror.example/dev_to",
            )])),
        ]);

        let found = discovery.discover(&registry).await;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "dev_to");
        assert_eq!(found[0].endpoint, "https://dev.to/feed");
    }
}
