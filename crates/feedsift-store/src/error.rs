use thiserror::Error;

/// Errors from the object store and the corpus/ledger codecs.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The object store answered with an unexpected status code.
    #[error("object store returned status {status} for {context}")]
    Status { context: String, status: u16 },

    /// The resumable-upload session violated the protocol (missing session
    /// URL, unparseable Range header).
    #[error("resumable upload protocol error: {0}")]
    Protocol(String),

    #[error("CSV codec error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid store URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl StoreError {
    /// Returns `true` for failures worth retrying after a backoff delay:
    /// network-level errors (timeout, connection reset), 5xx responses, and
    /// rate limiting (429). Protocol and codec errors are permanent.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            StoreError::Status { status, .. } => *status >= 500 || *status == 429,
            StoreError::Protocol(_)
            | StoreError::Csv(_)
            | StoreError::Json(_)
            | StoreError::InvalidUrl { .. } => false,
        }
    }
}
