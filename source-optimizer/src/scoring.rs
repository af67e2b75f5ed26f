use crate::feed_manager::SourceManager;
use crate::traits::RelevanceScorer;
use crate::types::{FeedItem, Result, ScoredArticle};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Per-batch statistics handed to `update_metrics`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatchScore {
    pub total_count: u64,
    pub relevant_count: u64,
    pub avg_score: f64,
}

impl BatchScore {
    /// Items strictly above `cutoff` are relevant; an empty batch averages 0.
    pub fn from_scores(scores: &[f64], cutoff: f64) -> Self {
        let total_count = scores.len() as u64;
        let relevant_count = scores.iter().filter(|&&s| s > cutoff).count() as u64;
        let avg_score = if scores.is_empty() {
            0.0
        } else {
            scores.iter().sum::<f64>() / scores.len() as f64
        };

        Self {
            total_count,
            relevant_count,
            avg_score,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FetchCycleReport {
    /// Items above the cutoff, in source rank order then feed order.
    pub articles: Vec<ScoredArticle>,
    pub sources_scored: usize,
    pub sources_failed: Vec<String>,
}

/// Scores fetched batches with an injected scorer and folds the results
/// into the manager's metrics.
pub struct ScoringEngine {
    scorer: Arc<dyn RelevanceScorer>,
    relevance_cutoff: f64,
}

impl ScoringEngine {
    pub fn new(scorer: Arc<dyn RelevanceScorer>, relevance_cutoff: f64) -> Self {
        Self {
            scorer,
            relevance_cutoff,
        }
    }

    /// A scorer failure counts as 0.0; out-of-range values are clamped.
    pub async fn score_item(&self, item: &FeedItem) -> f64 {
        match self.scorer.score(item).await {
            Ok(score) if score.is_nan() => {
                warn!(link = %item.link, "Scorer returned NaN, using 0.0");
                0.0
            }
            Ok(score) => score.clamp(0.0, 1.0),
            Err(e) => {
                warn!(
                    link = %item.link,
                    scorer = %self.scorer.scorer_name(),
                    "Error analyzing relevance: {}",
                    e
                );
                0.0
            }
        }
    }

    pub async fn score_items(&self, items: &[FeedItem]) -> Vec<f64> {
        let mut scores = Vec::with_capacity(items.len());
        for item in items {
            scores.push(self.score_item(item).await);
        }
        scores
    }

    /// Score one source's batch and record it. Returns the batch statistics
    /// and the per-item scores, in item order, even when the source turned
    /// out to be unknown to the store.
    pub async fn score_source(
        &self,
        manager: &mut SourceManager,
        name: &str,
        items: &[FeedItem],
    ) -> (BatchScore, Vec<f64>) {
        let scores = self.score_items(items).await;
        let batch = BatchScore::from_scores(&scores, self.relevance_cutoff);
        manager.update_metrics(name, batch.total_count, batch.relevant_count, batch.avg_score);

        debug!(
            source = %name,
            total = batch.total_count,
            relevant = batch.relevant_count,
            avg = batch.avg_score,
            "Scored batch"
        );
        (batch, scores)
    }

    /// Fetch the current top sources, score the head of each feed, update
    /// metrics and collect the relevant items. A source whose fetch fails is
    /// skipped and its metrics are left alone.
    pub async fn run_fetch_cycle(&self, manager: &mut SourceManager) -> FetchCycleReport {
        let config = manager.config().clone();
        let fetcher = manager.fetcher();
        let mut report = FetchCycleReport::default();

        for source in manager.get_top_sources(config.fetch_source_limit) {
            info!(source = %source.name, "Fetching from source");
            let mut items = match fetcher.fetch(&source.uri).await {
                Ok(items) => items,
                Err(e) => {
                    warn!(source = %source.name, endpoint = %source.uri, "Error fetching from source: {}", e);
                    report.sources_failed.push(source.name);
                    continue;
                }
            };
            items.truncate(config.items_per_source);

            let (_, scores) = self.score_source(manager, &source.name, &items).await;
            report.sources_scored += 1;

            for (item, score) in items.into_iter().zip(scores) {
                if score > self.relevance_cutoff {
                    report.articles.push(ScoredArticle {
                        source: source.name.clone(),
                        score,
                        item,
                    });
                }
            }
        }

        info!(
            "Fetch cycle scored {} sources ({} failed), {} relevant articles",
            report.sources_scored,
            report.sources_failed.len(),
            report.articles.len()
        );
        report
    }
}

/// Best articles first by `(score, published)`; undated items sort after
/// dated ones with the same score.
pub fn rank_articles(mut articles: Vec<ScoredArticle>, limit: usize) -> Vec<ScoredArticle> {
    articles.sort_by(|a, b| compare_articles(b, a));
    articles.truncate(limit);
    articles
}

fn compare_articles(a: &ScoredArticle, b: &ScoredArticle) -> Ordering {
    a.score
        .total_cmp(&b.score)
        .then_with(|| a.item.published.cmp(&b.item.published))
}

const TECH_KEYWORDS: &[&str] = &[
    "artificial intelligence",
    "machine learning",
    "deep learning",
    "software engineering",
    "programming",
    "technology",
    "tech",
    "computer science",
    "data science",
    "ai",
    "ml",
    "coding",
];

/// Offline scorer: whole-word keyword hits, weighted towards the title.
pub struct KeywordScorer {
    keywords: Vec<String>,
    title_weight: f64,
    body_weight: f64,
}

impl KeywordScorer {
    pub fn new(keywords: Vec<String>) -> Self {
        Self {
            keywords: keywords.iter().map(|k| normalize_words(k)).collect(),
            title_weight: 0.35,
            body_weight: 0.15,
        }
    }

    fn hits(&self, text: &str) -> usize {
        let haystack = normalize_words(text);
        self.keywords
            .iter()
            .filter(|k| !k.trim().is_empty() && haystack.contains(k.as_str()))
            .count()
    }

    pub fn score_text(&self, title: &str, body: &str) -> f64 {
        let score = self.hits(title) as f64 * self.title_weight
            + self.hits(body) as f64 * self.body_weight;
        score.min(1.0)
    }
}

impl Default for KeywordScorer {
    fn default() -> Self {
        Self::new(TECH_KEYWORDS.iter().map(|k| k.to_string()).collect())
    }
}

#[async_trait]
impl RelevanceScorer for KeywordScorer {
    fn scorer_name(&self) -> String {
        "keyword".to_string()
    }

    async fn score(&self, item: &FeedItem) -> Result<f64> {
        let body = format!("{} {}", item.summary, item.body());
        Ok(self.score_text(&item.title, &body))
    }
}

/// Lowercase alphanumeric words joined by single spaces and padded with a
/// space on each side, so `contains(" ai ")` is a whole-word match.
fn normalize_words(text: &str) -> String {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect();
    format!(" {} ", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FnScorer;
    use crate::types::OptimizerError;

    fn item(title: &str, summary: &str) -> FeedItem {
        FeedItem {
            title: title.to_string(),
            link: format!("https://example.com/{}", title.len()),
            summary: summary.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn batch_counts_strictly_above_cutoff() {
        let batch = BatchScore::from_scores(&[0.5, 0.51, 0.9, 0.0], 0.5);
        assert_eq!(batch.total_count, 4);
        assert_eq!(batch.relevant_count, 2);
        assert!((batch.avg_score - 0.4775).abs() < 1e-12);
    }

    #[test]
    fn empty_batch_averages_zero() {
        let batch = BatchScore::from_scores(&[], 0.5);
        assert_eq!(batch, BatchScore { total_count: 0, relevant_count: 0, avg_score: 0.0 });
    }

    #[test]
    fn scorer_errors_and_nan_become_zero() {
        let engine = ScoringEngine::new(
            Arc::new(FnScorer::new("flaky", |item: &FeedItem| match item.title.as_str() {
                "boom" => Err(OptimizerError::Scoring("model unavailable".to_string())),
                "nan" => Ok(f64::NAN),
                "big" => Ok(7.0),
                _ => Ok(0.8),
            })),
            0.5,
        );
        let items = vec![item("boom", ""), item("nan", ""), item("big", ""), item("ok", "")];
        let scores = tokio_test::block_on(engine.score_items(&items));
        assert_eq!(scores, vec![0.0, 0.0, 1.0, 0.8]);
    }

    #[test]
    fn keyword_scorer_matches_whole_words() {
        let scorer = KeywordScorer::default();
        assert_eq!(scorer.score_text("He said hello", "Nothing to see"), 0.0);
        assert!(scorer.score_text("New AI chip", "") > 0.3);
        assert!(
            scorer.score_text("Machine learning in practice", "deep learning and coding")
                > scorer.score_text("Machine learning in practice", "")
        );
    }

    #[test]
    fn keyword_scorer_caps_at_one() {
        let scorer = KeywordScorer::default();
        let score = scorer.score_text(
            "AI ML tech programming coding technology",
            "machine learning deep learning data science computer science",
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn rank_articles_orders_by_score_then_recency() {
        use chrono::{TimeZone, Utc};

        let mut older = item("older", "");
        older.published = Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
        let mut newer = item("newer!", "");
        newer.published = Some(Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap());

        let articles = vec![
            ScoredArticle { source: "a".into(), score: 0.7, item: older },
            ScoredArticle { source: "b".into(), score: 0.9, item: item("undated", "") },
            ScoredArticle { source: "c".into(), score: 0.7, item: newer },
        ];

        let ranked = rank_articles(articles, 2);
        let sources: Vec<_> = ranked.iter().map(|a| a.source.as_str()).collect();
        assert_eq!(sources, vec!["b", "c"]);
    }
}
