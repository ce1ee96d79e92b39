//! Ingest command: read payload files, normalize, score, persist.
//!
//! Malformed payload lines and records are logged and skipped rather than
//! propagated, so one bad line never aborts a run.

use std::path::PathBuf;

use anyhow::Context;
use feedsift_core::{AppConfig, Record, RetryPolicy};
use feedsift_normalize::{SourceKind, SourcePayload};
use feedsift_pipeline::{ingest, load_reference_vectors, IngestResult};
use feedsift_scoring::{EmbeddingClient, ScoringEngine};
use feedsift_store::CorpusStore;

pub(crate) async fn run_ingest(
    config: &AppConfig,
    inputs: &[String],
) -> anyhow::Result<IngestResult> {
    let mut records: Vec<Record> = Vec::new();
    for input in inputs {
        let (kind, path) = parse_input(input)?;
        records.extend(read_payload_file(kind, &path).await?);
    }
    tracing::info!(files = inputs.len(), records = records.len(), "payload files normalized");

    let objects = crate::object_store(config)?;
    let corpus = CorpusStore::new(objects.clone(), &config.corpus_object);
    let refs = load_reference_vectors(&objects, &config.reference_object).await?;

    let client = EmbeddingClient::new(
        &config.embed_base_url,
        config.embed_timeout(),
        config.embed_api_token.clone(),
    )?;
    let engine = ScoringEngine::new(
        client,
        config.embed_batch_size,
        RetryPolicy::fixed(config.embed_max_retries, config.embed_retry_delay()),
        config.max_concurrent_batches,
        config.checkpoint_every,
    );

    Ok(ingest(&corpus, &engine, &refs, records).await?)
}

/// Parses one `kind=path` command line argument.
fn parse_input(input: &str) -> anyhow::Result<(SourceKind, PathBuf)> {
    let (kind, path) = input
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("expected kind=path, got '{input}'"))?;
    let kind = match kind {
        "rss" => SourceKind::Rss,
        "api" => SourceKind::Api,
        "search" => SourceKind::Search,
        "social" => SourceKind::Social,
        other => anyhow::bail!("unknown source kind '{other}' (expected rss, api, search, or social)"),
    };
    Ok((kind, PathBuf::from(path)))
}

/// Reads one JSON-lines payload file and normalizes each line.
async fn read_payload_file(kind: SourceKind, path: &PathBuf) -> anyhow::Result<Vec<Record>> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read payload file {}", path.display()))?;

    let mut records = Vec::new();
    for (index, line) in body.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let payload: SourcePayload = match serde_json::from_str(line) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "skipping malformed payload line"
                );
                continue;
            }
        };
        match feedsift_normalize::normalize(&payload, kind) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    line = index + 1,
                    error = %e,
                    "dropping record"
                );
            }
        }
    }
    Ok(records)
}
