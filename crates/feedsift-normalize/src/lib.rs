//! Record normalizer -- converts source-specific feed payloads into the
//! canonical [`feedsift_core::Record`] schema.
//!
//! Normalization is a pure function over its input: markup is stripped,
//! control characters removed, the identity derived by canonicalizing the
//! source URL, and timestamps parsed into UTC. Unparseable timestamps are
//! not an error; the record simply carries no publication time.

pub mod clean;
pub mod error;
pub mod identity;
pub mod normalizer;
pub mod payload;
pub mod timestamp;

pub use error::NormalizeError;
pub use normalizer::normalize;
pub use payload::{SourceKind, SourcePayload};
