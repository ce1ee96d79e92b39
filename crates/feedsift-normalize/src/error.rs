use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    /// The payload is missing a required structural field. The record is
    /// dropped; the run continues.
    #[error("malformed payload from {source_name}: {reason}")]
    MalformedInput { source_name: String, reason: String },
}
