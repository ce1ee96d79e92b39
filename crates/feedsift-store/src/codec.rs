//! CSV codec for corpus snapshots.
//!
//! The corpus object is a plain tabular file consumed by tooling outside
//! this pipeline, so every column is always present and absent values are
//! empty strings, never a null marker. `CSS` carries the relevance score
//! and `Embedding` the JSON-serialized vector; both are empty until the
//! record has been scored.

use chrono::{DateTime, NaiveDateTime, Utc};
use feedsift_core::{Record, Snapshot};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

const PUBLISHED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One corpus row as it appears on the wire.
#[derive(Debug, Serialize, Deserialize)]
struct CorpusRow {
    #[serde(rename = "Source")]
    source: String,
    #[serde(rename = "Author")]
    author: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Short_Summary")]
    short_summary: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Content")]
    content: String,
    #[serde(rename = "Published_At")]
    published_at: String,
    #[serde(rename = "URL")]
    url: String,
    #[serde(rename = "CSS")]
    css: String,
    #[serde(rename = "Embedding")]
    embedding: String,
}

impl From<&Record> for CorpusRow {
    fn from(record: &Record) -> Self {
        Self {
            source: record.source.clone(),
            author: record.author.clone(),
            title: record.title.clone(),
            short_summary: record.summary.clone(),
            description: record.raw_description.clone(),
            content: record.raw_content.clone(),
            published_at: record
                .published_at
                .map(|dt| dt.format(PUBLISHED_AT_FORMAT).to_string())
                .unwrap_or_default(),
            url: record.identity.clone(),
            css: record
                .relevance_score
                .map(|s| s.to_string())
                .unwrap_or_default(),
            embedding: record
                .embedding
                .as_ref()
                .and_then(|v| serde_json::to_string(v).ok())
                .unwrap_or_default(),
        }
    }
}

impl CorpusRow {
    fn into_record(self) -> Record {
        let published_at = parse_published_at(&self.published_at);
        let relevance_score = if self.css.is_empty() {
            None
        } else {
            match self.css.parse::<f32>() {
                Ok(score) => Some(score),
                Err(_) => {
                    tracing::warn!(url = %self.url, css = %self.css, "invalid CSS value, treating record as unscored");
                    None
                }
            }
        };
        // Score and embedding are attached together; a row with one but not
        // the other is treated as unscored so it gets re-scored next run.
        let embedding = if self.embedding.is_empty() || relevance_score.is_none() {
            None
        } else {
            serde_json::from_str::<Vec<f32>>(&self.embedding).ok()
        };
        let relevance_score = if embedding.is_none() { None } else { relevance_score };

        Record {
            identity: self.url,
            source: self.source,
            author: self.author,
            title: self.title,
            summary: self.short_summary,
            raw_description: self.description,
            raw_content: self.content,
            published_at,
            relevance_score,
            embedding,
        }
    }
}

fn parse_published_at(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(raw, PUBLISHED_AT_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

/// Serializes a snapshot into CSV bytes, rows ordered by identity.
///
/// # Errors
///
/// Returns [`StoreError::Csv`] if serialization fails.
pub fn encode_snapshot(snapshot: &Snapshot) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in snapshot.records() {
        writer.serialize(CorpusRow::from(record))?;
    }
    writer
        .into_inner()
        .map_err(|e| StoreError::Protocol(format!("CSV writer flush failed: {e}")))
}

/// Parses CSV bytes into a snapshot, deduplicating on identity
/// (latest row wins).
///
/// # Errors
///
/// Returns [`StoreError::Csv`] if the input is not valid CSV.
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, StoreError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let mut snapshot = Snapshot::new();
    for row in reader.deserialize::<CorpusRow>() {
        let row = row?;
        if row.url.is_empty() {
            tracing::warn!("corpus row without URL, skipping");
            continue;
        }
        snapshot.insert(row.into_record());
    }
    Ok(snapshot)
}
