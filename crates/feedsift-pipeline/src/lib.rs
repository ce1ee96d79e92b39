//! Run orchestration: the ingestion coordinator and the match filter.
//!
//! A run is ingest-then-deliver. Ingestion deduplicates incoming records
//! against the corpus, scores what is still unscored, and persists the
//! merged snapshot. Delivery selects scored, recent, above-threshold
//! records the ledger has not seen and marks them delivered before handing
//! them out.

pub mod error;
pub mod filter;
pub mod ingest;

pub use error::PipelineError;
pub use filter::{filter_and_mark, RecencyPolicy};
pub use ingest::{ingest, load_reference_vectors, IngestResult};
