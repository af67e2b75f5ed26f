use crate::types::{FeedItem, Result};
use async_trait::async_trait;

/// Pulls the current items of a feed endpoint.
///
/// Used both for the add-time liveness probe and for per-cycle scoring.
/// Implementations must give up on their own (timeouts) and report a
/// transport problem as an error rather than hang.
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    /// Fetch and parse the endpoint, returning items in feed order.
    async fn fetch(&self, endpoint: &str) -> Result<Vec<FeedItem>>;
}

/// Rates one item's relevance on `[0.0, 1.0]`.
#[async_trait]
pub trait RelevanceScorer: Send + Sync {
    fn scorer_name(&self) -> String;

    async fn score(&self, item: &FeedItem) -> Result<f64>;
}

/// Adapts a plain function into a `RelevanceScorer`.
pub struct FnScorer<F> {
    name: String,
    func: F,
}

impl<F> FnScorer<F>
where
    F: Fn(&FeedItem) -> Result<f64> + Send + Sync,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> RelevanceScorer for FnScorer<F>
where
    F: Fn(&FeedItem) -> Result<f64> + Send + Sync,
{
    fn scorer_name(&self) -> String {
        self.name.clone()
    }

    async fn score(&self, item: &FeedItem) -> Result<f64> {
        (self.func)(item)
    }
}
