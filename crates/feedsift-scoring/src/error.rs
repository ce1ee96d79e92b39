use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The embedding service answered with a non-success status.
    #[error("embedding service returned status {status}")]
    Status { status: u16 },

    /// The response vectors are not index-aligned with the request batch.
    #[error("embedding service returned {got} vectors for {expected} inputs")]
    Misaligned { expected: usize, got: usize },

    /// A returned vector does not match the reference set's dimensionality.
    #[error("embedding dimension {got} does not match reference dimension {expected}")]
    DimensionMismatch { expected: usize, got: usize },

    /// The reference vector file is empty or internally inconsistent.
    #[error("invalid reference vector set: {0}")]
    InvalidReferenceSet(String),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ScoringError {
    /// Returns `true` for failures worth retrying with the fixed
    /// inter-attempt delay: timeouts, connection failures, 5xx, and rate
    /// limiting. A misaligned or mis-dimensioned response will not improve
    /// on retry.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            ScoringError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ScoringError::Status { status } => *status >= 500 || *status == 429,
            ScoringError::Misaligned { .. }
            | ScoringError::DimensionMismatch { .. }
            | ScoringError::InvalidReferenceSet(_)
            | ScoringError::Json(_) => false,
        }
    }
}
