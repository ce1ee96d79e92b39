//! Deliver command: filter the corpus and print matches for the notifier.

use chrono::{Duration, Utc};
use feedsift_core::AppConfig;
use feedsift_pipeline::{filter_and_mark, RecencyPolicy};
use feedsift_store::{CorpusStore, DeliveryLedger};

/// Selects deliverable records, marks them in the ledger, and prints each
/// as one JSON line on stdout. Returns the number delivered.
pub(crate) async fn run_deliver(config: &AppConfig) -> anyhow::Result<usize> {
    let objects = crate::object_store(config)?;
    let corpus = CorpusStore::new(objects.clone(), &config.corpus_object);
    let snapshot = corpus.load().await?;
    let mut ledger = DeliveryLedger::load(objects, &config.ledger_object).await?;

    // TrendForce stamps items well before its feed surfaces them, so it
    // keeps a wider window than the configured default.
    let policy = RecencyPolicy::new(Duration::hours(config.recency_window_hours))
        .with_override("TrendForce", Duration::hours(72));

    let matches = filter_and_mark(
        &snapshot,
        &policy,
        config.score_threshold,
        &mut ledger,
        Utc::now(),
    )
    .await?;

    for record in &matches {
        let line = serde_json::json!({
            "source": record.source,
            "title": record.title,
            "url": record.identity,
            "summary": record.summary,
            "relevance_score": record.relevance_score,
            "published_at": record.published_at,
        });
        println!("{line}");
    }
    Ok(matches.len())
}
