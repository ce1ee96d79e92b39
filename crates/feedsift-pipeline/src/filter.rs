//! Match filter: selects novel, recent, above-threshold records and marks
//! them delivered.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use feedsift_core::{Record, Snapshot};
use feedsift_store::DeliveryLedger;

use crate::error::PipelineError;

/// How old a record may be and still be delivered.
///
/// The default window is 48 hours. Some vendors stamp items well before the
/// feed actually surfaces them; those sources get a wider window so their
/// items are not stale on arrival.
#[derive(Debug, Clone)]
pub struct RecencyPolicy {
    default_window: Duration,
    overrides: BTreeMap<String, Duration>,
}

impl Default for RecencyPolicy {
    fn default() -> Self {
        let mut overrides = BTreeMap::new();
        overrides.insert("TrendForce".to_string(), Duration::hours(72));
        Self {
            default_window: Duration::hours(48),
            overrides,
        }
    }
}

impl RecencyPolicy {
    #[must_use]
    pub fn new(default_window: Duration) -> Self {
        Self {
            default_window,
            overrides: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_override(mut self, source: &str, window: Duration) -> Self {
        self.overrides.insert(source.to_string(), window);
        self
    }

    #[must_use]
    pub fn window_for(&self, source: &str) -> Duration {
        self.overrides
            .get(source)
            .copied()
            .unwrap_or(self.default_window)
    }
}

/// Selects deliverable records and records them in the ledger.
///
/// A record is deliverable when it has a score at or above `threshold`, a
/// parsed publication time no older than its source's recency window
/// (boundary inclusive: exactly `now - window` is in), and its identity is
/// not yet in the ledger. Output is ordered by relevance score descending,
/// ties broken by publication time descending.
///
/// The ledger write happens before the matches are returned; if it fails,
/// no matches are returned and nothing is considered delivered, so an item
/// can be delivered late but never twice.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] when the ledger cannot be persisted.
pub async fn filter_and_mark(
    snapshot: &Snapshot,
    policy: &RecencyPolicy,
    threshold: f32,
    ledger: &mut DeliveryLedger,
    now: DateTime<Utc>,
) -> Result<Vec<Record>, PipelineError> {
    let mut matches: Vec<Record> = snapshot
        .records()
        .filter(|record| {
            let Some(score) = record.relevance_score else {
                return false;
            };
            let Some(published_at) = record.published_at else {
                return false;
            };
            score >= threshold
                && now - published_at <= policy.window_for(&record.source)
                && !ledger.contains(&record.identity)
        })
        .cloned()
        .collect();

    matches.sort_by(|a, b| {
        b.relevance_score
            .partial_cmp(&a.relevance_score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.published_at.cmp(&a.published_at))
    });

    ledger
        .record_delivered(matches.iter().map(|r| r.identity.clone()))
        .await?;
    tracing::info!(matches = matches.len(), threshold, "match filter completed");
    Ok(matches)
}
