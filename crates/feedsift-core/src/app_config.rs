use std::time::Duration;

/// Application configuration, loaded once at process start and passed
/// explicitly into the components that need it.
#[derive(Clone)]
pub struct AppConfig {
    /// Base URL of the object store holding corpus, ledger, and reference
    /// vectors.
    pub store_base_url: String,
    pub store_bucket: String,
    pub corpus_object: String,
    pub ledger_object: String,
    pub reference_object: String,
    pub store_timeout_secs: u64,
    pub store_max_retries: u32,
    pub store_backoff_base_ms: u64,
    /// Resumable upload chunk size in bytes.
    pub upload_chunk_size: usize,

    /// Base URL of the remote embedding service.
    pub embed_base_url: String,
    pub embed_api_token: Option<String>,
    pub embed_batch_size: usize,
    pub embed_max_retries: u32,
    pub embed_retry_delay_secs: u64,
    pub embed_timeout_secs: u64,
    pub max_concurrent_batches: usize,
    /// Persist scoring progress after this many scored records.
    pub checkpoint_every: usize,

    pub score_threshold: f32,
    pub recency_window_hours: i64,
    pub log_level: String,
}

impl AppConfig {
    #[must_use]
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    #[must_use]
    pub fn embed_timeout(&self) -> Duration {
        Duration::from_secs(self.embed_timeout_secs)
    }

    #[must_use]
    pub fn embed_retry_delay(&self) -> Duration {
        Duration::from_secs(self.embed_retry_delay_secs)
    }

    #[must_use]
    pub fn store_backoff_base(&self) -> Duration {
        Duration::from_millis(self.store_backoff_base_ms)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("store_base_url", &self.store_base_url)
            .field("store_bucket", &self.store_bucket)
            .field("corpus_object", &self.corpus_object)
            .field("ledger_object", &self.ledger_object)
            .field("reference_object", &self.reference_object)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field("store_max_retries", &self.store_max_retries)
            .field("store_backoff_base_ms", &self.store_backoff_base_ms)
            .field("upload_chunk_size", &self.upload_chunk_size)
            .field("embed_base_url", &self.embed_base_url)
            .field(
                "embed_api_token",
                &self.embed_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("embed_batch_size", &self.embed_batch_size)
            .field("embed_max_retries", &self.embed_max_retries)
            .field("embed_retry_delay_secs", &self.embed_retry_delay_secs)
            .field("embed_timeout_secs", &self.embed_timeout_secs)
            .field("max_concurrent_batches", &self.max_concurrent_batches)
            .field("checkpoint_every", &self.checkpoint_every)
            .field("score_threshold", &self.score_threshold)
            .field("recency_window_hours", &self.recency_window_hours)
            .field("log_level", &self.log_level)
            .finish()
    }
}
