// src/history/mod.rs

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use tracing::debug;

use crate::predict::PredictionRecord;

/// Entries kept across all runs of a session.
pub const HISTORY_CAPACITY: usize = 50;
/// Entries shown in the trend view.
pub const TREND_WINDOW: usize = 10;

/// One past outcome in the rolling history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: DateTime<Utc>,
    pub batch_id: String,
    pub defect_probability: f64,
}

impl From<&PredictionRecord> for HistoryEntry {
    fn from(record: &PredictionRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            batch_id: record.batch_id.clone(),
            defect_probability: record.defect_probability,
        }
    }
}

/// A point on the trend chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Local `HH:MM`
    pub time: String,
    pub defect_probability: f64,
}

/// Append-only recency window over prediction outcomes.
///
/// Oldest entries are evicted once the cap is exceeded; the cap is over
/// the whole session, not per run. Entries are never deduplicated.
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    /// Append one entry per record, in record order. Returns how many old entries were evicted.
    pub fn append(&mut self, records: &[PredictionRecord]) -> usize {
        self.entries.extend(records.iter().map(HistoryEntry::from));

        let mut evicted = 0;
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
            evicted += 1;
        }
        debug!(appended = records.len(), evicted, len = self.entries.len(), "history updated");
        evicted
    }

    /// The last `TREND_WINDOW` entries, oldest first.
    pub fn trend(&self) -> impl Iterator<Item = &HistoryEntry> {
        let skip = self.entries.len().saturating_sub(TREND_WINDOW);
        self.entries.iter().skip(skip)
    }

    pub fn trend_points(&self) -> Vec<TrendPoint> {
        self.trend()
            .map(|e| TrendPoint {
                time: e.timestamp.with_timezone(&Local).format("%H:%M").to_string(),
                defect_probability: e.defect_probability,
            })
            .collect()
    }
}
