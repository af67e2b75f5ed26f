pub mod types;
pub mod traits;
pub mod parser;
pub mod fetcher;
pub mod rss_utils;
pub mod metrics_store;
pub mod registry;
pub mod feed_manager;
pub mod discovery;
pub mod scoring;
pub mod optimizer;
pub mod ranking;
pub mod schedule;

pub use types::*;
pub use traits::{FeedFetcher, FnScorer, RelevanceScorer};
pub use parser::FeedParser;
pub use fetcher::HttpFeedFetcher;
pub use metrics_store::{LoadReport, MetricsStore};
pub use registry::SourceRegistry;
pub use feed_manager::SourceManager;
pub use discovery::{CandidateDiscovery, CandidateProvider, CandidateSource, DiscoveryMethod};
pub use scoring::{rank_articles, BatchScore, FetchCycleReport, KeywordScorer, ScoringEngine};
pub use optimizer::{CycleSummary, OptimizationPolicy};
pub use ranking::{rank_sources, PerformanceReport};
pub use schedule::Schedule;
