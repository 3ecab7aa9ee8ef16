//! Per-document scroll position memory
//!
//! Best-effort only: a missing, unreadable or corrupt file is treated as
//! "no record" and write failures are logged, never surfaced.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Saved scroll position of one document
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollRecord {
    /// Scroll offset in pixels
    pub top: f64,
    /// Offset as a fraction of the scrollable range (0.0-1.0)
    pub ratio: f64,
    pub updated_at: DateTime<Utc>,
}

impl ScrollRecord {
    /// Build a record from the current scroll state
    pub fn capture(top: f64, scroll_height: f64, viewport_height: f64) -> Self {
        let range = scroll_height - viewport_height;
        let ratio = if range > 0.0 {
            (top / range).clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            top: top.max(0.0),
            ratio,
            updated_at: Utc::now(),
        }
    }

    fn is_valid(&self) -> bool {
        self.top.is_finite() && self.top >= 0.0 && (0.0..=1.0).contains(&self.ratio)
    }

    /// Offset to scroll to for the current layout.
    ///
    /// Prefers the ratio so the position survives zoom changes; falls back to
    /// the raw offset while the layout has no scrollable range yet.
    pub fn target_offset(&self, scroll_height: f64, viewport_height: f64) -> f64 {
        let range = scroll_height - viewport_height;
        if range > 0.0 && self.ratio > 0.0 {
            self.ratio * range
        } else {
            self.top
        }
    }
}

/// JSON file of scroll records keyed by document id
#[derive(Debug, Clone)]
pub struct ScrollMemory {
    path: PathBuf,
}

impl ScrollMemory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved position for `doc_id`, if a valid one exists
    pub fn load(&self, doc_id: &str) -> Option<ScrollRecord> {
        let record = self.read_all().remove(doc_id)?;
        if record.is_valid() {
            Some(record)
        } else {
            tracing::debug!("Ignoring invalid scroll record for {}", doc_id);
            None
        }
    }

    /// Store the position for `doc_id`
    pub fn save(&self, doc_id: &str, record: ScrollRecord) {
        let mut records = self.read_all();
        records.insert(doc_id.to_string(), record);

        if let Err(e) = self.write_all(&records) {
            tracing::warn!("Failed to save scroll position to {:?}: {}", self.path, e);
        }
    }

    fn read_all(&self) -> HashMap<String, ScrollRecord> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return HashMap::new(),
        };

        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::debug!("Discarding corrupt scroll file {:?}: {}", self.path, e);
            HashMap::new()
        })
    }

    fn write_all(&self, records: &HashMap<String, ScrollRecord>) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(records)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        std::fs::write(&self.path, json)
    }
}
