//! Durable `name -> SourceMetrics` mapping.
//!
//! The on-disk form is one JSON object keyed by source name. Loading is
//! per-record: a malformed entry is logged and skipped, the rest still load.
//! Saving writes a sibling temp file and renames it over the target, so a
//! reader never observes a half-written file.

use crate::types::{EngagementAction, Result, SourceMetrics};
use chrono::Utc;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Outcome of a `load()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped: usize,
}

#[derive(Debug)]
pub struct MetricsStore {
    path: PathBuf,
    metrics: BTreeMap<String, SourceMetrics>,
}

impl MetricsStore {
    /// Empty store bound to `path`; nothing is read until `load()`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            metrics: BTreeMap::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory mapping with what is on disk.
    ///
    /// A missing file is an empty store. An unreadable file or a top level
    /// that is not an object leaves the store empty and logs an error, after
    /// copying the file to `<file>.bak`.
    pub fn load(&mut self) -> LoadReport {
        self.metrics.clear();

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No metrics file at {}, starting empty", self.path.display());
                return LoadReport::default();
            }
            Err(e) => {
                error!("Error loading metrics from {}: {}", self.path.display(), e);
                self.preserve_unreadable();
                return LoadReport::default();
            }
        };

        let records: Map<String, Value> = match serde_json::from_str(&content) {
            Ok(Value::Object(records)) => records,
            Ok(_) => {
                error!("Metrics file {} is not a JSON object", self.path.display());
                self.preserve_unreadable();
                return LoadReport::default();
            }
            Err(e) => {
                error!("Error parsing metrics file {}: {}", self.path.display(), e);
                self.preserve_unreadable();
                return LoadReport::default();
            }
        };

        let mut report = LoadReport::default();
        for (name, record) in records {
            match Self::decode_record(&name, record) {
                Ok(metrics) => {
                    self.metrics.insert(name, metrics);
                    report.loaded += 1;
                }
                Err(reason) => {
                    warn!(source = %name, "Skipping malformed metrics record: {}", reason);
                    report.skipped += 1;
                }
            }
        }

        info!(
            "Loaded metrics for {} sources from {} ({} skipped)",
            report.loaded,
            self.path.display(),
            report.skipped
        );
        report
    }

    fn decode_record(name: &str, record: Value) -> std::result::Result<SourceMetrics, String> {
        let mut metrics: SourceMetrics =
            serde_json::from_value(record).map_err(|e| e.to_string())?;

        let score = metrics.avg_relevance_score;
        if !score.is_finite() || !(0.0..=1.0).contains(&score) {
            return Err(format!("avg_relevance_score {} outside [0, 1]", score));
        }
        if metrics.name != name {
            warn!(source = %name, "Record name '{}' differs from its key, using the key", metrics.name);
            metrics.name = name.to_string();
        }

        // The stored rate is never trusted.
        metrics.recompute_engagement_rate();
        Ok(metrics)
    }

    /// Write the full mapping to a temp file next to the target, then rename.
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(&self.metrics)?;
        let tmp = self.temp_path();
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        debug!("Saved metrics for {} sources to {}", self.metrics.len(), self.path.display());
        Ok(())
    }

    /// Keep a copy of a file `load()` could not use before a save overwrites it.
    fn preserve_unreadable(&self) {
        let backup = self.backup_path();
        match fs::copy(&self.path, &backup) {
            Ok(_) => warn!(
                "Metrics file {} will be overwritten on the next save; original kept at {}",
                self.path.display(),
                backup.display()
            ),
            Err(e) => warn!(
                "Metrics file {} will be overwritten on the next save; backup to {} failed: {}",
                self.path.display(),
                backup.display(),
                e
            ),
        }
    }

    pub fn backup_path(&self) -> PathBuf {
        self.sibling_path(".bak")
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling_path(".tmp")
    }

    fn sibling_path(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("source_metrics.json"));
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Fold one scored batch into a source's counters.
    ///
    /// Counters accumulate, `avg_relevance_score` is overwritten with this
    /// batch's mean, the rate is recomputed and `last_updated` stamped.
    /// Returns `false` (and warns) for an unknown source.
    ///
    /// Inputs are brought into the range `load()` accepts: a NaN average is
    /// 0.0, other averages are clamped to `[0, 1]` and `relevant_count` is
    /// capped at `article_count`.
    pub fn update_metrics(
        &mut self,
        name: &str,
        article_count: u64,
        relevant_count: u64,
        avg_score: f64,
    ) -> bool {
        let Some(metrics) = self.metrics.get_mut(name) else {
            warn!(source = %name, "Dropping metrics update for unknown source");
            return false;
        };

        let avg_score = if avg_score.is_nan() {
            warn!(source = %name, "NaN batch average, recording 0.0");
            0.0
        } else {
            avg_score.clamp(0.0, 1.0)
        };
        if relevant_count > article_count {
            warn!(
                source = %name,
                relevant_count,
                article_count,
                "More relevant items than items in batch, capping"
            );
        }
        let relevant_count = relevant_count.min(article_count);

        metrics.total_articles += article_count;
        metrics.relevant_articles += relevant_count;
        metrics.avg_relevance_score = avg_score;
        metrics.last_updated = Some(Utc::now());
        metrics.recompute_engagement_rate();

        debug!(
            source = %name,
            total = metrics.total_articles,
            relevant = metrics.relevant_articles,
            engagement_rate = metrics.engagement_rate,
            "Updated source metrics"
        );
        true
    }

    pub fn record_user_engagement(&mut self, name: &str, action: EngagementAction) -> bool {
        let Some(metrics) = self.metrics.get_mut(name) else {
            warn!(source = %name, %action, "Dropping engagement event for unknown source");
            return false;
        };

        match action {
            EngagementAction::Click => metrics.user_clicks += 1,
            EngagementAction::Download => metrics.user_downloads += 1,
        }
        true
    }

    pub fn get(&self, name: &str) -> Option<&SourceMetrics> {
        self.metrics.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.metrics.contains_key(name)
    }

    pub(crate) fn insert(&mut self, metrics: SourceMetrics) {
        self.metrics.insert(metrics.name.clone(), metrics);
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<SourceMetrics> {
        self.metrics.remove(name)
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.metrics.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceMetrics> {
        self.metrics.values()
    }
}
