//! Scoring engine: batching, bounded parallelism, retries, and progress
//! checkpointing.

use std::future::Future;
use std::pin::Pin;

use feedsift_core::{retry_with_backoff, Record, RetryPolicy};
use futures::stream::{self, StreamExt};

use crate::client::EmbeddingClient;
use crate::error::ScoringError;
use crate::reference::ReferenceVectorSet;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Collaborator that persists scoring progress mid-run so a crash does not
/// force re-scoring of records that already made it through.
///
/// Checkpoint failures are logged and do not abort the run; the final
/// persist at the end of ingestion still gates correctness.
pub trait Checkpoint: Send + Sync {
    fn persist<'a>(
        &'a self,
        scored: &'a [Record],
    ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>>;
}

/// Result of one scoring pass.
#[derive(Debug, Default)]
pub struct ScoreOutcome {
    /// Records with score and embedding attached.
    pub scored: Vec<Record>,
    /// Records from batches that exhausted their retries, returned
    /// unmodified so the caller can persist them unscored.
    pub failed: Vec<Record>,
}

/// Batches records to the embedding service and attaches relevance scores.
pub struct ScoringEngine {
    client: EmbeddingClient,
    batch_size: usize,
    retry: RetryPolicy,
    max_concurrent_batches: usize,
    checkpoint_every: usize,
}

impl ScoringEngine {
    #[must_use]
    pub fn new(
        client: EmbeddingClient,
        batch_size: usize,
        retry: RetryPolicy,
        max_concurrent_batches: usize,
        checkpoint_every: usize,
    ) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
            retry,
            max_concurrent_batches: max_concurrent_batches.max(1),
            checkpoint_every: checkpoint_every.max(1),
        }
    }

    /// Scores every record against the reference set.
    ///
    /// Batches are processed with bounded parallelism; each worker returns
    /// its own partial list and the lists are merged here as they complete,
    /// so there is no shared mutable accumulator across workers. A batch
    /// whose remote call fails after all retries is skipped and its records
    /// reported in [`ScoreOutcome::failed`]; other batches are unaffected.
    pub async fn score(
        &self,
        records: Vec<Record>,
        refs: &ReferenceVectorSet,
        checkpoint: Option<&dyn Checkpoint>,
    ) -> ScoreOutcome {
        if records.is_empty() {
            return ScoreOutcome::default();
        }

        let total = records.len();
        let mut batches: Vec<Vec<Record>> = Vec::new();
        let mut iter = records.into_iter().peekable();
        while iter.peek().is_some() {
            batches.push(iter.by_ref().take(self.batch_size).collect());
        }
        let batch_count = batches.len();
        tracing::info!(
            records = total,
            batches = batch_count,
            batch_size = self.batch_size,
            "scoring run started"
        );

        let mut results = stream::iter(batches.into_iter().enumerate())
            .map(|(index, batch)| async move { (index, self.score_batch(batch, refs).await) })
            .buffer_unordered(self.max_concurrent_batches);

        let mut outcome = ScoreOutcome::default();
        let mut since_checkpoint = 0usize;
        while let Some((index, result)) = results.next().await {
            match result {
                Ok(scored) => {
                    since_checkpoint += scored.len();
                    outcome.scored.extend(scored);
                    tracing::info!(
                        batch = index,
                        scored = outcome.scored.len(),
                        total,
                        "batch scored"
                    );
                    if since_checkpoint >= self.checkpoint_every {
                        if let Some(checkpoint) = checkpoint {
                            match checkpoint.persist(&outcome.scored).await {
                                Ok(()) => tracing::info!(
                                    scored = outcome.scored.len(),
                                    "scoring progress checkpointed"
                                ),
                                Err(e) => tracing::warn!(
                                    error = %e,
                                    "checkpoint persist failed, continuing"
                                ),
                            }
                        }
                        since_checkpoint = 0;
                    }
                }
                Err((err, batch)) => {
                    tracing::error!(
                        batch = index,
                        records = batch.len(),
                        error = %err,
                        "batch failed after retries, skipping"
                    );
                    outcome.failed.extend(batch);
                }
            }
        }

        tracing::info!(
            scored = outcome.scored.len(),
            failed = outcome.failed.len(),
            "scoring run finished"
        );
        outcome
    }

    /// Scores one batch, retrying transient remote failures with the fixed
    /// inter-attempt delay. On failure the original records are handed back
    /// so the caller can persist them unscored.
    async fn score_batch(
        &self,
        batch: Vec<Record>,
        refs: &ReferenceVectorSet,
    ) -> Result<Vec<Record>, (ScoringError, Vec<Record>)> {
        let texts: Vec<String> = batch.iter().map(Record::embed_text).collect();

        let vectors = match retry_with_backoff(&self.retry, ScoringError::is_transient, || {
            self.client.embed_batch(&texts)
        })
        .await
        {
            Ok(vectors) => vectors,
            Err(err) => return Err((err, batch)),
        };

        for vector in &vectors {
            if vector.len() != refs.dimension() {
                let err = ScoringError::DimensionMismatch {
                    expected: refs.dimension(),
                    got: vector.len(),
                };
                return Err((err, batch));
            }
        }

        Ok(batch
            .into_iter()
            .zip(vectors)
            .map(|(record, vector)| {
                let score = refs.best_match(&vector);
                record.with_score(score, vector)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn record(identity: &str, title: &str) -> Record {
        Record {
            identity: identity.to_string(),
            source: "Wire".to_string(),
            author: String::new(),
            title: title.to_string(),
            summary: String::new(),
            raw_description: String::new(),
            raw_content: String::new(),
            published_at: None,
            relevance_score: None,
            embedding: None,
        }
    }

    fn refs() -> ReferenceVectorSet {
        let mut map = BTreeMap::new();
        map.insert("semis".to_string(), vec![1.0, 0.0]);
        map.insert("ai".to_string(), vec![0.0, 1.0]);
        ReferenceVectorSet::new(map).unwrap()
    }

    fn engine(server_url: &str, batch_size: usize, checkpoint_every: usize) -> ScoringEngine {
        let client = EmbeddingClient::new(server_url, Duration::from_secs(5), None).unwrap();
        ScoringEngine::new(
            client,
            batch_size,
            RetryPolicy::fixed(2, Duration::ZERO),
            2,
            checkpoint_every,
        )
    }

    fn vector_response(vectors: &[[f32; 2]]) -> ResponseTemplate {
        let predictions: Vec<serde_json::Value> = vectors
            .iter()
            .map(|v| serde_json::json!({"values": v}))
            .collect();
        ResponseTemplate::new(200)
            .set_body_json(serde_json::json!({ "predictions": predictions }))
    }

    #[tokio::test]
    async fn attaches_best_match_score_and_embedding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(vector_response(&[[1.0, 0.0], [0.0, -1.0]]))
            .mount(&server)
            .await;

        let outcome = engine(&server.uri(), 10, 1000)
            .score(
                vec![record("https://e.com/a", "a"), record("https://e.com/b", "b")],
                &refs(),
                None,
            )
            .await;

        assert_eq!(outcome.scored.len(), 2);
        assert!(outcome.failed.is_empty());
        let a = outcome
            .scored
            .iter()
            .find(|r| r.identity == "https://e.com/a")
            .unwrap();
        assert!((a.relevance_score.unwrap() - 1.0).abs() < 1e-6);
        // [0.0, -1.0] is opposite "ai" but orthogonal to "semis": the best
        // match is 0.0, not the -1.0 a single-reference set would produce.
        let b = outcome
            .scored
            .iter()
            .find(|r| r.identity == "https://e.com/b")
            .unwrap();
        assert!(b.relevance_score.unwrap().abs() < 1e-6);
        assert_eq!(b.embedding.as_deref(), Some(&[0.0, -1.0][..]));
    }

    #[tokio::test]
    async fn one_failing_batch_does_not_poison_the_others() {
        let server = MockServer::start().await;
        // Batch size 1: each record is its own batch, distinguished by its
        // request text.
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(body_string_contains("doomed"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(vector_response(&[[1.0, 0.0]]))
            .mount(&server)
            .await;

        let outcome = engine(&server.uri(), 1, 1000)
            .score(
                vec![
                    record("https://e.com/ok1", "fine"),
                    record("https://e.com/bad", "doomed"),
                    record("https://e.com/ok2", "also fine"),
                ],
                &refs(),
                None,
            )
            .await;

        assert_eq!(outcome.scored.len(), 2);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].identity, "https://e.com/bad");
        assert!(!outcome.failed[0].is_scored());
    }

    #[tokio::test]
    async fn transient_failures_are_retried_within_a_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(vector_response(&[[0.5, 0.5]]))
            .mount(&server)
            .await;

        let outcome = engine(&server.uri(), 10, 1000)
            .score(vec![record("https://e.com/a", "a")], &refs(), None)
            .await;
        assert_eq!(outcome.scored.len(), 1);
        assert!(outcome.failed.is_empty());
    }

    #[tokio::test]
    async fn dimension_mismatch_fails_the_batch_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "predictions": [{"values": [0.1, 0.2, 0.3, 0.4]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = engine(&server.uri(), 10, 1000)
            .score(vec![record("https://e.com/a", "a")], &refs(), None)
            .await;
        assert!(outcome.scored.is_empty());
        assert_eq!(outcome.failed.len(), 1);
    }

    struct CountingCheckpoint {
        calls: Mutex<Vec<usize>>,
    }

    impl Checkpoint for CountingCheckpoint {
        fn persist<'a>(
            &'a self,
            scored: &'a [Record],
        ) -> Pin<Box<dyn Future<Output = Result<(), BoxError>> + Send + 'a>> {
            Box::pin(async move {
                self.calls.lock().unwrap().push(scored.len());
                Ok(())
            })
        }
    }

    #[tokio::test]
    async fn checkpoints_after_the_configured_number_of_records() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(vector_response(&[[1.0, 0.0]]))
            .mount(&server)
            .await;

        let checkpoint = CountingCheckpoint {
            calls: Mutex::new(Vec::new()),
        };
        // Batch size 1, checkpoint every 2 scored records, 4 records: the
        // checkpoint should fire twice.
        let outcome = engine(&server.uri(), 1, 2)
            .score(
                vec![
                    record("https://e.com/a", "a"),
                    record("https://e.com/b", "b"),
                    record("https://e.com/c", "c"),
                    record("https://e.com/d", "d"),
                ],
                &refs(),
                Some(&checkpoint),
            )
            .await;

        assert_eq!(outcome.scored.len(), 4);
        let calls = checkpoint.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), &[2, 4]);
    }
}
