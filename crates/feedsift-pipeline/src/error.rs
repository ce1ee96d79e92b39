use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("persistence failure: {0}")]
    Store(#[from] feedsift_store::StoreError),

    #[error("scoring failure: {0}")]
    Scoring(#[from] feedsift_scoring::ScoringError),

    /// The reference vector object is absent from the store. Scoring cannot
    /// proceed without it; there is no sensible default.
    #[error("reference vector object '{0}' not found in store")]
    MissingReferenceVectors(String),
}
