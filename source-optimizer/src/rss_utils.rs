/// Feed-specific helper functions shared by the fetcher, registry and reports.

/// URL utilities for feed endpoints
pub mod url {
    use crate::types::{OptimizerError, Result};
    use url::Url;

    /// Parse an endpoint and require an http(s) scheme with a host.
    pub fn validate_feed_url(url_str: &str) -> Result<Url> {
        let parsed = Url::parse(url_str)?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(OptimizerError::UnsupportedScheme {
                scheme: parsed.scheme().to_string(),
                url: url_str.to_string(),
            });
        }
        if parsed.host().is_none() {
            return Err(OptimizerError::InvalidUrl(url::ParseError::EmptyHost));
        }

        Ok(parsed)
    }

    /// Extract domain from URL
    pub fn extract_domain(url_str: &str) -> Option<String> {
        Url::parse(url_str)
            .ok()
            .and_then(|url| url.domain().map(|d| d.to_string()))
    }
}

/// Time utilities for activity windows
pub mod time {
    use chrono::{DateTime, Utc};

    /// Whole days elapsed between `ts` and `now` are fewer than `days`.
    /// Timestamps in the future count as recent.
    pub fn within_days(ts: DateTime<Utc>, now: DateTime<Utc>, days: i64) -> bool {
        now.signed_duration_since(ts).num_days() < days
    }
}
