use thiserror::Error;

use crate::app_config::AppConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required env var: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for env var {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual
/// environment so it can be tested with a pure `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default =
        |var: &str, default: &str| -> String { lookup(var).unwrap_or_else(|_| default.to_string()) };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_f32 = |var: &str, default: &str| -> Result<f32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<f32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_i64 = |var: &str, default: &str| -> Result<i64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<i64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let store_base_url = require("FEEDSIFT_STORE_URL")?;
    let store_bucket = require("FEEDSIFT_STORE_BUCKET")?;
    let embed_base_url = require("FEEDSIFT_EMBED_URL")?;

    let corpus_object = or_default("FEEDSIFT_CORPUS_OBJECT", "corpus.csv");
    let ledger_object = or_default("FEEDSIFT_LEDGER_OBJECT", "delivered.txt");
    let reference_object = or_default("FEEDSIFT_REFERENCE_OBJECT", "reference_vectors.json");
    let store_timeout_secs = parse_u64("FEEDSIFT_STORE_TIMEOUT_SECS", "30")?;
    let store_max_retries = parse_u32("FEEDSIFT_STORE_MAX_RETRIES", "5")?;
    let store_backoff_base_ms = parse_u64("FEEDSIFT_STORE_BACKOFF_BASE_MS", "1000")?;
    let upload_chunk_size = parse_usize("FEEDSIFT_UPLOAD_CHUNK_SIZE", "262144")?;

    let embed_api_token = lookup("FEEDSIFT_EMBED_API_TOKEN").ok();
    let embed_batch_size = parse_usize("FEEDSIFT_EMBED_BATCH_SIZE", "40")?;
    let embed_max_retries = parse_u32("FEEDSIFT_EMBED_MAX_RETRIES", "5")?;
    let embed_retry_delay_secs = parse_u64("FEEDSIFT_EMBED_RETRY_DELAY_SECS", "5")?;
    let embed_timeout_secs = parse_u64("FEEDSIFT_EMBED_TIMEOUT_SECS", "60")?;
    let max_concurrent_batches = parse_usize("FEEDSIFT_MAX_CONCURRENT_BATCHES", "4")?;
    let checkpoint_every = parse_usize("FEEDSIFT_CHECKPOINT_EVERY", "500")?;

    let score_threshold = parse_f32("FEEDSIFT_SCORE_THRESHOLD", "0.615")?;
    let recency_window_hours = parse_i64("FEEDSIFT_RECENCY_WINDOW_HOURS", "48")?;
    let log_level = or_default("FEEDSIFT_LOG_LEVEL", "info");

    if embed_batch_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDSIFT_EMBED_BATCH_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
    if upload_chunk_size == 0 {
        return Err(ConfigError::InvalidEnvVar {
            var: "FEEDSIFT_UPLOAD_CHUNK_SIZE".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }

    Ok(AppConfig {
        store_base_url,
        store_bucket,
        corpus_object,
        ledger_object,
        reference_object,
        store_timeout_secs,
        store_max_retries,
        store_backoff_base_ms,
        upload_chunk_size,
        embed_base_url,
        embed_api_token,
        embed_batch_size,
        embed_max_retries,
        embed_retry_delay_secs,
        embed_timeout_secs,
        max_concurrent_batches,
        checkpoint_every,
        score_threshold,
        recency_window_hours,
        log_level,
    })
}
