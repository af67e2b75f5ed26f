use crate::types::{FeedItem, OptimizerError, Result};
use chrono::Utc;
use feed_rs::parser;
use std::collections::HashSet;
use tracing::debug;

/// Turns a fetched RSS/Atom body into `FeedItem`s.
pub struct FeedParser;

impl FeedParser {
    /// Parse a feed body. Entries without a link, and repeats of a link or
    /// guid already seen in the same body, are dropped. Feed order is kept.
    pub fn parse_items(content: &str) -> Result<Vec<FeedItem>> {
        let normalized = Self::normalize_encoding(content)?;
        debug!("Parsing feed content ({} bytes)", normalized.len());

        let feed = parser::parse(normalized.as_bytes())
            .map_err(|e| OptimizerError::Parse(format!("Failed to parse feed: {}", e)))?;

        let mut seen_guids = HashSet::new();
        let mut seen_links = HashSet::new();
        let mut items = Vec::with_capacity(feed.entries.len());

        for entry in feed.entries {
            if !entry.id.is_empty() && !seen_guids.insert(entry.id.clone()) {
                debug!("Skipping duplicate entry with GUID: {}", entry.id);
                continue;
            }
            let Some(item) = Self::convert_entry(entry) else {
                continue;
            };
            if !seen_links.insert(item.link.clone()) {
                debug!("Skipping duplicate entry with URL: {}", item.link);
                continue;
            }
            items.push(item);
        }

        debug!("Parsed feed with {} items", items.len());
        Ok(items)
    }

    fn convert_entry(entry: feed_rs::model::Entry) -> Option<FeedItem> {
        let link = entry.links.first()?.href.clone();
        let title = entry.title.map(|t| t.content).unwrap_or_default();
        let summary = entry.summary.map(|s| s.content).unwrap_or_default();
        let content = entry.content.and_then(|c| c.body);
        let published = entry
            .published
            .or(entry.updated)
            .map(|dt| dt.with_timezone(&Utc));

        Some(FeedItem {
            title,
            link,
            summary,
            published,
            content,
        })
    }

    /// Cheap sniff for RSS/Atom markers before handing a body to the parser.
    pub fn is_valid_feed_content(content: &str) -> bool {
        let content_lower = content.to_lowercase();

        content_lower.contains("<rss")
            || content_lower.contains("<feed")
            || content_lower.contains("<rdf:rdf")
            || content_lower.contains("<channel")
    }

    pub fn normalize_encoding(content: &str) -> Result<String> {
        let normalized = content
            .trim_start_matches('\u{feff}')
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .trim()
            .to_string();

        if normalized.is_empty() {
            return Err(OptimizerError::Parse(
                "Empty content after normalization".to_string(),
            ));
        }

        Ok(normalized)
    }
}
