//! Shared domain types and policies for the feedsift pipeline.
//!
//! Holds the canonical [`Record`] schema, the deduplicated [`Snapshot`]
//! collection, environment-driven configuration, and the retry/backoff
//! policy shared by the scoring and persistence paths.

pub mod app_config;
pub mod config;
pub mod record;
pub mod retry;

pub use app_config::AppConfig;
pub use config::{load_app_config, ConfigError};
pub use record::{Record, RunSummary, Snapshot};
pub use retry::{retry_with_backoff, Backoff, RetryPolicy};
