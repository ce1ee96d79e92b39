//! Embedding and relevance scoring.
//!
//! Batches record text to the remote embedding service, computes each
//! record's relevance as its best cosine match against the reference vector
//! set, and isolates batch failures so one bad batch never poisons the
//! rest of a run.

pub mod client;
pub mod engine;
pub mod error;
pub mod reference;
pub mod similarity;

pub use client::EmbeddingClient;
pub use engine::{Checkpoint, ScoreOutcome, ScoringEngine};
pub use error::ScoringError;
pub use reference::ReferenceVectorSet;
pub use similarity::cosine_similarity;
