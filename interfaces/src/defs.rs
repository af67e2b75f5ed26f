use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named feed endpoint as handed between the engine and its consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveSourceSpec {
    pub name: String,
    pub uri: String,
}

impl LiveSourceSpec {
    pub fn new(name: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            uri: uri.into(),
        }
    }
}

/// One raw item as produced by a feed fetcher, in feed order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedItem {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published: Option<DateTime<Utc>>,
    pub content: Option<String>,
}

impl FeedItem {
    /// Full body when the feed carried one, the summary otherwise.
    pub fn body(&self) -> &str {
        self.content.as_deref().unwrap_or(&self.summary)
    }
}

/// An item that cleared the relevance cutoff during a fetch cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredArticle {
    pub source: String,
    pub score: f64,
    pub item: FeedItem,
}

// Object style note:
// The downstream digest builder only ever sees `LiveSourceSpec` and
// `ScoredArticle`. Everything that mutates source statistics stays inside
// the engine crate.
