use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// Use the interfaces crate for the collaborator-facing types
pub use interfaces::defs::{FeedItem, LiveSourceSpec, ScoredArticle};

/// Accumulated statistics for one tracked source.
///
/// `engagement_rate` is derived from the two article counters and is
/// recomputed whenever they change, including right after a load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetrics {
    pub name: String,
    #[serde(alias = "url")]
    pub endpoint: String,
    pub total_articles: u64,
    pub relevant_articles: u64,
    pub user_clicks: u64,
    pub user_downloads: u64,
    pub avg_relevance_score: f64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub last_updated: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(default)]
    pub engagement_rate: f64,
}

impl SourceMetrics {
    /// Fresh entry for a newly admitted source: zero counters, stamped now.
    pub fn new(name: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            endpoint: endpoint.into(),
            total_articles: 0,
            relevant_articles: 0,
            user_clicks: 0,
            user_downloads: 0,
            avg_relevance_score: 0.0,
            last_updated: Some(Utc::now()),
            is_active: true,
            engagement_rate: 0.0,
        }
    }

    pub fn recompute_engagement_rate(&mut self) {
        self.engagement_rate = if self.total_articles > 0 {
            self.relevant_articles as f64 / self.total_articles as f64
        } else {
            0.0
        };
    }
}

/// Timestamps are written as RFC 3339. Older files may carry naive ISO-8601
/// timestamps without an offset; those are read as UTC.
mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|s| parse(&s).map_err(de::Error::custom)).transpose()
    }

    pub fn parse(raw: &str) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Ok(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
    }
}

/// A user action attributed to a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementAction {
    Click,
    Download,
}

impl FromStr for EngagementAction {
    type Err = OptimizerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "click" => Ok(Self::Click),
            "download" => Ok(Self::Download),
            other => Err(OptimizerError::General(format!(
                "unknown engagement action '{}' (expected click or download)",
                other
            ))),
        }
    }
}

impl fmt::Display for EngagementAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Click => f.write_str("click"),
            Self::Download => f.write_str("download"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "Source-Optimizer/1.0".to_string(),
            timeout_seconds: 30,
            max_retries: 2,
            retry_delay_seconds: 2,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

/// Numeric policy for scoring, eviction, admission and reporting.
#[derive(Debug, Clone)]
pub struct OptimizerConfig {
    /// Minimum engagement rate to keep a source.
    pub engagement_threshold: f64,
    /// Minimum batch relevance to keep a source.
    pub relevance_threshold: f64,
    /// Registry ceiling, checked at admission time only.
    pub max_sources: usize,
    /// Items scoring strictly above this count as relevant.
    pub relevance_cutoff: f64,
    pub fetch_source_limit: usize,
    pub items_per_source: usize,
    pub top_articles: usize,
    pub report_top_sources: usize,
    pub recent_window_days: i64,
    pub metrics_path: PathBuf,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            engagement_threshold: 0.3,
            relevance_threshold: 0.5,
            max_sources: 50,
            relevance_cutoff: 0.5,
            fetch_source_limit: 15,
            items_per_source: 10,
            top_articles: 10,
            report_top_sources: 5,
            recent_window_days: 7,
            metrics_path: PathBuf::from("source_metrics.json"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OptimizerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported URL scheme '{scheme}' for {url}")]
    UnsupportedScheme { scheme: String, url: String },

    #[error("Feed at {url} yielded no items")]
    EmptyFeed { url: String },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("Unknown source: {name}")]
    UnknownSource { name: String },

    #[error("Scoring error: {0}")]
    Scoring(String),

    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, OptimizerError>;
