use crate::parser::FeedParser;
use crate::rss_utils::url::validate_feed_url;
use crate::traits::FeedFetcher;
use crate::types::{FeedItem, FetchConfig, OptimizerError, Result};
use async_trait::async_trait;
use backoff::{backoff::Backoff, exponential::ExponentialBackoff, SystemClock};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

const BYTES_PER_MB: usize = 1024 * 1024;

/// HTTP feed fetcher: one GET per call, retried with exponential backoff,
/// bounded by the client timeout so a dead host surfaces as an error.
pub struct HttpFeedFetcher {
    client: Client,
    config: FetchConfig,
}

impl HttpFeedFetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    fn backoff(&self) -> ExponentialBackoff<SystemClock> {
        let delay = Duration::from_secs(self.config.retry_delay_seconds);
        ExponentialBackoff {
            current_interval: delay,
            initial_interval: delay,
            max_interval: delay * 32,
            multiplier: 2.0,
            max_elapsed_time: Some(delay * 60),
            ..Default::default()
        }
    }

    async fn fetch_body(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        let mut backoff = self.backoff();
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(
                        "Fetched {} ({} bytes) in {}ms",
                        url,
                        body.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(body);
                }
                // Oversized feeds will not shrink on retry.
                Err(e @ OptimizerError::FeedTooLarge { .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    break;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| OptimizerError::General(format!("Failed to fetch {}", url))))
    }

    async fn fetch_once(&self, url: &str) -> Result<String> {
        let mut response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(OptimizerError::General(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let limit = self.config.max_feed_size_mb * BYTES_PER_MB;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit {
                return Err(OptimizerError::FeedTooLarge {
                    size_mb: content_length as usize / BYTES_PER_MB,
                });
            }
        }

        // Chunked responses carry no length; count while reading.
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
            if body.len() > limit {
                return Err(OptimizerError::FeedTooLarge {
                    size_mb: body.len() / BYTES_PER_MB,
                });
            }
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, endpoint: &str) -> Result<Vec<FeedItem>> {
        validate_feed_url(endpoint)?;

        let body = self.fetch_body(endpoint).await?;
        if !FeedParser::is_valid_feed_content(&body) {
            return Err(OptimizerError::Parse(format!(
                "Response from {} does not look like RSS or Atom",
                endpoint
            )));
        }

        let items = FeedParser::parse_items(&body)?;
        info!("Fetched {} items from {}", items.len(), endpoint);
        Ok(items)
    }
}
