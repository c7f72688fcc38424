//! Warning tracking for book reconstruction anomalies.
//!
//! Rejected events are reported to the caller as errors; this module keeps
//! the running record of those conditions so operators can inspect counts
//! and recent detail without stopping the feed. Categories mirror the error
//! taxonomy, severities separate data anomalies from engine bugs, and the
//! whole record can be exported as JSON for offline analysis.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

/// Category of a tracked warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningCategory {
    /// Add for an order id already resting.
    DuplicateOrder,
    /// Cancel/Modify/Fill for an unknown order id.
    UnknownOrder,
    /// Sequence at or behind the last applied event.
    StaleEvent,
    /// Hole detected in the sequence stream.
    SequenceGap,
    /// Event failed field validation.
    ValidationFailure,
    /// Cross-index consistency check failed (engine bug).
    InvariantViolation,
    /// Book was cleared by a Reset event.
    BookReset,
}

impl WarningCategory {
    /// Stable uppercase name for logs and exports.
    pub fn name(&self) -> &'static str {
        match self {
            WarningCategory::DuplicateOrder => "DUPLICATE_ORDER",
            WarningCategory::UnknownOrder => "UNKNOWN_ORDER",
            WarningCategory::StaleEvent => "STALE_EVENT",
            WarningCategory::SequenceGap => "SEQUENCE_GAP",
            WarningCategory::ValidationFailure => "VALIDATION_FAILURE",
            WarningCategory::InvariantViolation => "INVARIANT_VIOLATION",
            WarningCategory::BookReset => "BOOK_RESET",
        }
    }

    /// Severity level (1=low, 2=medium, 3=high).
    pub fn severity(&self) -> u8 {
        match self {
            WarningCategory::DuplicateOrder => 2,
            WarningCategory::UnknownOrder => 2,
            WarningCategory::StaleEvent => 1,
            WarningCategory::SequenceGap => 2,
            WarningCategory::ValidationFailure => 2,
            WarningCategory::InvariantViolation => 3,
            WarningCategory::BookReset => 1,
        }
    }
}

/// A single warning record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Warning {
    /// Classification of the condition.
    pub category: WarningCategory,

    /// Human-readable detail.
    pub detail: String,

    /// Sequence of the event that triggered the warning, if known.
    pub sequence: Option<u64>,

    /// Order id involved, if any.
    pub order_id: Option<u64>,

    /// Matching-engine timestamp of the triggering event, if known.
    pub ts_event: Option<i64>,
}

/// Aggregated view over everything the tracker has seen.
#[derive(Debug, Clone, Serialize)]
pub struct WarningSummary {
    /// Total warnings recorded (including evicted detail records).
    pub total: u64,

    /// Per-category counts, sorted descending.
    pub by_category: Vec<(String, u64)>,
}

/// Tracks warning counts and a bounded window of recent detail records.
#[derive(Debug, Clone)]
pub struct WarningTracker {
    counts: AHashMap<WarningCategory, u64>,
    recent: VecDeque<Warning>,
    max_retained: usize,
    total: u64,
}

impl Default for WarningTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WarningTracker {
    /// Default cap on retained detail records.
    pub const DEFAULT_MAX_RETAINED: usize = 1024;

    /// Create a tracker with the default retention cap.
    pub fn new() -> Self {
        Self::with_max_retained(Self::DEFAULT_MAX_RETAINED)
    }

    /// Create a tracker retaining at most `max_retained` detail records;
    /// counts are always unbounded.
    pub fn with_max_retained(max_retained: usize) -> Self {
        Self {
            counts: AHashMap::new(),
            recent: VecDeque::with_capacity(max_retained.min(64)),
            max_retained,
            total: 0,
        }
    }

    /// Record a warning.
    pub fn record(
        &mut self,
        category: WarningCategory,
        detail: impl Into<String>,
        sequence: Option<u64>,
        order_id: Option<u64>,
        ts_event: Option<i64>,
    ) {
        self.total += 1;
        *self.counts.entry(category).or_insert(0) += 1;

        if self.max_retained == 0 {
            return;
        }
        if self.recent.len() == self.max_retained {
            self.recent.pop_front();
        }
        self.recent.push_back(Warning {
            category,
            detail: detail.into(),
            sequence,
            order_id,
            ts_event,
        });
    }

    /// Count for one category.
    pub fn count(&self, category: WarningCategory) -> u64 {
        self.counts.get(&category).copied().unwrap_or(0)
    }

    /// Total warnings recorded.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// The retained recent detail records, oldest first.
    pub fn recent(&self) -> impl Iterator<Item = &Warning> {
        self.recent.iter()
    }

    /// Aggregate summary, categories sorted by count descending.
    pub fn summary(&self) -> WarningSummary {
        let mut by_category: Vec<(String, u64)> = self
            .counts
            .iter()
            .map(|(category, &count)| (category.name().to_string(), count))
            .collect();
        by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        WarningSummary {
            total: self.total,
            by_category,
        }
    }

    /// Export the retained detail records as pretty-printed JSON.
    pub fn export_to_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        let records: Vec<&Warning> = self.recent.iter().collect();
        serde_json::to_writer_pretty(&mut writer, &records)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        writer.flush()
    }

    /// Drop all counts and detail records.
    pub fn clear(&mut self) {
        self.counts.clear();
        self.recent.clear();
        self.total = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_count() {
        let mut tracker = WarningTracker::new();
        tracker.record(WarningCategory::UnknownOrder, "cancel for 42", Some(7), Some(42), None);
        tracker.record(WarningCategory::UnknownOrder, "fill for 43", Some(8), Some(43), None);
        tracker.record(WarningCategory::SequenceGap, "expected 9, got 12", Some(12), None, None);

        assert_eq!(tracker.total(), 3);
        assert_eq!(tracker.count(WarningCategory::UnknownOrder), 2);
        assert_eq!(tracker.count(WarningCategory::SequenceGap), 1);
        assert_eq!(tracker.count(WarningCategory::StaleEvent), 0);
    }

    #[test]
    fn test_retention_cap_evicts_oldest() {
        let mut tracker = WarningTracker::with_max_retained(2);
        for sequence in 1..=4u64 {
            tracker.record(
                WarningCategory::StaleEvent,
                format!("stale {sequence}"),
                Some(sequence),
                None,
                None,
            );
        }

        assert_eq!(tracker.total(), 4);
        let retained: Vec<u64> = tracker.recent().filter_map(|w| w.sequence).collect();
        assert_eq!(retained, vec![3, 4]);
    }

    #[test]
    fn test_zero_retention_still_counts() {
        let mut tracker = WarningTracker::with_max_retained(0);
        tracker.record(WarningCategory::DuplicateOrder, "dup", Some(1), Some(5), None);
        assert_eq!(tracker.total(), 1);
        assert_eq!(tracker.recent().count(), 0);
    }

    #[test]
    fn test_summary_sorted_by_count() {
        let mut tracker = WarningTracker::new();
        for _ in 0..3 {
            tracker.record(WarningCategory::StaleEvent, "stale", None, None, None);
        }
        tracker.record(WarningCategory::SequenceGap, "gap", None, None, None);

        let summary = tracker.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_category[0], ("STALE_EVENT".to_string(), 3));
        assert_eq!(summary.by_category[1], ("SEQUENCE_GAP".to_string(), 1));
    }

    #[test]
    fn test_severity_ordering() {
        assert!(WarningCategory::InvariantViolation.severity() > WarningCategory::UnknownOrder.severity());
        assert!(WarningCategory::UnknownOrder.severity() > WarningCategory::StaleEvent.severity());
    }

    #[test]
    fn test_export_to_file() {
        let mut tracker = WarningTracker::new();
        tracker.record(
            WarningCategory::UnknownOrder,
            "cancel for 42",
            Some(7),
            Some(42),
            Some(123),
        );

        let path = std::env::temp_dir().join("mbo_book_engine_warnings_test.json");
        tracker.export_to_file(&path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<Warning> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].order_id, Some(42));
        assert_eq!(parsed[0].category, WarningCategory::UnknownOrder);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_clear() {
        let mut tracker = WarningTracker::new();
        tracker.record(WarningCategory::BookReset, "reset", Some(1), None, None);
        tracker.clear();
        assert_eq!(tracker.total(), 0);
        assert_eq!(tracker.recent().count(), 0);
    }
}
