//! Ingestion coordinator: dedup against the corpus, score, persist.

use std::pin::Pin;

use feedsift_core::{Record, Snapshot};
use feedsift_scoring::{Checkpoint, ReferenceVectorSet, ScoringEngine};
use feedsift_store::{CorpusStore, ObjectStore};

use crate::error::PipelineError;

/// Counters from one ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestResult {
    /// New identities added to the corpus.
    pub added: usize,
    /// Incoming records whose identity was already present.
    pub skipped_duplicates: usize,
    /// Records persisted unscored because their batch exhausted its retries.
    pub failed_to_score: usize,
}

/// Fetches the reference vector set from the object store.
///
/// # Errors
///
/// Returns [`PipelineError::MissingReferenceVectors`] when the object does
/// not exist, or the underlying store/parse error otherwise.
pub async fn load_reference_vectors(
    objects: &ObjectStore,
    object: &str,
) -> Result<ReferenceVectorSet, PipelineError> {
    let body = objects
        .get_text(object)
        .await?
        .ok_or_else(|| PipelineError::MissingReferenceVectors(object.to_string()))?;
    let refs = ReferenceVectorSet::from_json(&body)?;
    tracing::info!(object = %object, interests = refs.len(), dimension = refs.dimension(), "loaded reference vectors");
    Ok(refs)
}

/// Persists mid-run scoring progress by merging scored records into the
/// snapshot that existed when scoring started. A crash between checkpoints
/// costs at most one checkpoint interval of re-scoring.
struct SnapshotCheckpoint {
    corpus: CorpusStore,
    base: Snapshot,
}

impl Checkpoint for SnapshotCheckpoint {
    fn persist<'a>(
        &'a self,
        scored: &'a [Record],
    ) -> Pin<
        Box<
            dyn std::future::Future<
                    Output = Result<(), Box<dyn std::error::Error + Send + Sync>>,
                > + Send
                + 'a,
        >,
    > {
        Box::pin(async move {
            let mut snapshot = self.base.clone();
            snapshot.merge(scored.iter().cloned());
            self.corpus.save(&snapshot).await?;
            Ok(())
        })
    }
}

/// Runs one ingestion pass.
///
/// Incoming records whose identity is already in the corpus are skipped,
/// never overwritten, so a duplicate can never wipe an existing score. The
/// scoring input is the fresh records plus any previously persisted records
/// still lacking a score; scored records are never re-scored. Records whose
/// batch failed are persisted unscored and picked up again on the next run.
///
/// # Errors
///
/// Returns [`PipelineError::Store`] when the corpus cannot be loaded or the
/// final snapshot cannot be persisted; in that case the prior corpus object
/// remains authoritative.
pub async fn ingest(
    corpus: &CorpusStore,
    engine: &ScoringEngine,
    refs: &ReferenceVectorSet,
    new_records: Vec<Record>,
) -> Result<IngestResult, PipelineError> {
    let mut snapshot = corpus.load().await?;

    let mut skipped_duplicates = 0usize;
    let mut added = 0usize;
    for record in new_records {
        if snapshot.contains(&record.identity) {
            tracing::debug!(identity = %record.identity, "duplicate identity, skipping");
            skipped_duplicates += 1;
        } else {
            snapshot.insert(record);
            added += 1;
        }
    }

    // Fresh records were inserted unscored, so the unscored subset of the
    // snapshot is exactly the scoring input: fresh arrivals plus stragglers
    // left over from previously failed batches.
    let to_score: Vec<Record> = snapshot
        .records()
        .filter(|r| !r.is_scored())
        .cloned()
        .collect();
    tracing::info!(
        added,
        skipped_duplicates,
        to_score = to_score.len(),
        corpus = snapshot.len(),
        "ingestion pass started"
    );

    let failed_to_score = if to_score.is_empty() {
        0
    } else {
        let checkpoint = SnapshotCheckpoint {
            corpus: corpus.clone(),
            base: snapshot.clone(),
        };
        let outcome = engine.score(to_score, refs, Some(&checkpoint)).await;
        let failed = outcome.failed.len();
        snapshot.merge(outcome.scored);
        failed
    };

    corpus.save(&snapshot).await?;

    Ok(IngestResult {
        added,
        skipped_duplicates,
        failed_to_score,
    })
}
