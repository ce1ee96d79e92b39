//! Canonical record schema and the deduplicated corpus snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One ingested item, normalized from a source-specific payload.
///
/// Text fields are never null: an absent value is the empty string, for
/// compatibility with downstream consumers expecting plain text columns.
/// `relevance_score` and `embedding` are populated together by the scoring
/// engine and are absent until a record has been scored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Canonicalized source URL; unique within the corpus and still a
    /// dereferenceable link.
    pub identity: String,
    pub source: String,
    pub author: String,
    pub title: String,
    /// Short summary shown to the notifier (description, optionally joined
    /// with content).
    pub summary: String,
    pub raw_description: String,
    pub raw_content: String,
    /// Publication time normalized to UTC. `None` when the source timestamp
    /// could not be parsed; such records are excluded from recency matching.
    pub published_at: Option<DateTime<Utc>>,
    /// Maximum cosine similarity against the reference vector set.
    pub relevance_score: Option<f32>,
    pub embedding: Option<Vec<f32>>,
}

impl Record {
    /// True once the scoring engine has attached a score and embedding.
    #[must_use]
    pub fn is_scored(&self) -> bool {
        self.relevance_score.is_some()
    }

    /// The text submitted to the embedding service for this record.
    ///
    /// Concatenation order (source, title, summary) matters for weighting
    /// but not correctness.
    #[must_use]
    pub fn embed_text(&self) -> String {
        format!("{} {} {}", self.source, self.title, self.summary)
    }

    /// Returns a copy with the score and embedding attached.
    #[must_use]
    pub fn with_score(mut self, score: f32, embedding: Vec<f32>) -> Self {
        self.relevance_score = Some(score);
        self.embedding = Some(embedding);
        self
    }
}

/// The full set of records at a point in time, keyed by identity.
///
/// No two records share an identity by construction; inserting an identity
/// that is already present replaces the stored record (latest write wins).
/// Iteration order is stable (ordered by identity) so serialized snapshots
/// are deterministic.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    records: BTreeMap<String, Record>,
}

impl Snapshot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a snapshot from a list of records, keeping the most recently
    /// listed record when the same identity appears twice.
    #[must_use]
    pub fn from_records(records: Vec<Record>) -> Self {
        let mut snapshot = Self::new();
        for record in records {
            snapshot.insert(record);
        }
        snapshot
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, identity: &str) -> bool {
        self.records.contains_key(identity)
    }

    #[must_use]
    pub fn get(&self, identity: &str) -> Option<&Record> {
        self.records.get(identity)
    }

    /// Inserts a record, replacing any existing record with the same
    /// identity. Returns `true` if the identity was new.
    pub fn insert(&mut self, record: Record) -> bool {
        self.records.insert(record.identity.clone(), record).is_none()
    }

    /// Inserts every record in `records`, latest write winning on identity
    /// collisions.
    pub fn merge<I: IntoIterator<Item = Record>>(&mut self, records: I) {
        for record in records {
            self.insert(record);
        }
    }

    /// Iterates records in identity order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Consumes the snapshot, yielding records in identity order.
    #[must_use]
    pub fn into_records(self) -> Vec<Record> {
        self.records.into_values().collect()
    }
}

/// Counters reported at the end of a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// New identities added to the corpus.
    pub added: usize,
    /// Incoming records whose identity was already in the corpus.
    pub skipped_duplicates: usize,
    /// Records left unscored because their batch exhausted its retries.
    pub failed_to_score: usize,
    /// Records handed to the notifier by the match filter.
    pub delivered: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(identity: &str, title: &str) -> Record {
        Record {
            identity: identity.to_string(),
            source: "Example Wire".to_string(),
            author: String::new(),
            title: title.to_string(),
            summary: "a summary".to_string(),
            raw_description: String::new(),
            raw_content: String::new(),
            published_at: None,
            relevance_score: None,
            embedding: None,
        }
    }

    #[test]
    fn insert_reports_new_identity() {
        let mut snapshot = Snapshot::new();
        assert!(snapshot.insert(record("https://example.com/a", "first")));
        assert!(!snapshot.insert(record("https://example.com/a", "second")));
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn duplicate_identity_keeps_latest() {
        let snapshot = Snapshot::from_records(vec![
            record("https://example.com/a", "first"),
            record("https://example.com/a", "second"),
        ]);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("https://example.com/a").unwrap().title, "second");
    }

    #[test]
    fn iteration_is_ordered_by_identity() {
        let snapshot = Snapshot::from_records(vec![
            record("https://example.com/b", "b"),
            record("https://example.com/a", "a"),
        ]);
        let identities: Vec<&str> = snapshot.records().map(|r| r.identity.as_str()).collect();
        assert_eq!(identities, vec!["https://example.com/a", "https://example.com/b"]);
    }

    #[test]
    fn embed_text_concatenates_source_title_summary() {
        let r = record("https://example.com/a", "Chips Rally");
        assert_eq!(r.embed_text(), "Example Wire Chips Rally a summary");
    }

    #[test]
    fn with_score_populates_both_fields() {
        let r = record("https://example.com/a", "t").with_score(0.7, vec![0.1, 0.2]);
        assert!(r.is_scored());
        assert_eq!(r.relevance_score, Some(0.7));
        assert_eq!(r.embedding.as_deref(), Some(&[0.1, 0.2][..]));
    }
}
