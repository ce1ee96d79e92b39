//! The reference vector set: one embedding per declared interest.

use std::collections::BTreeMap;

use crate::error::ScoringError;
use crate::similarity::cosine_similarity;

/// Immutable label -> embedding map, loaded once per run.
///
/// Validated at construction: non-empty and dimensionally consistent, so
/// every vector produced by the scoring engine can be compared against
/// every reference vector.
#[derive(Debug, Clone)]
pub struct ReferenceVectorSet {
    vectors: BTreeMap<String, Vec<f32>>,
    dimension: usize,
}

impl ReferenceVectorSet {
    /// Builds the set from a label -> vector map.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::InvalidReferenceSet`] when the map is empty,
    /// any vector is empty, or the vectors disagree on dimensionality.
    pub fn new(vectors: BTreeMap<String, Vec<f32>>) -> Result<Self, ScoringError> {
        let Some(dimension) = vectors.values().next().map(Vec::len) else {
            return Err(ScoringError::InvalidReferenceSet(
                "reference vector set is empty".to_string(),
            ));
        };
        if dimension == 0 {
            return Err(ScoringError::InvalidReferenceSet(
                "reference vectors have zero dimension".to_string(),
            ));
        }
        for (label, vector) in &vectors {
            if vector.len() != dimension {
                return Err(ScoringError::InvalidReferenceSet(format!(
                    "vector '{label}' has dimension {} but expected {dimension}",
                    vector.len()
                )));
            }
        }
        Ok(Self { vectors, dimension })
    }

    /// Parses the persisted JSON object `{label: [f32, ...], ...}`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoringError::Json`] on malformed JSON or
    /// [`ScoringError::InvalidReferenceSet`] on structural problems.
    pub fn from_json(body: &str) -> Result<Self, ScoringError> {
        let vectors: BTreeMap<String, Vec<f32>> = serde_json::from_str(body)?;
        Self::new(vectors)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// The record's relevance score: the **maximum** cosine similarity
    /// across all reference vectors. A niche-but-strong match to one
    /// interest is deliberately not diluted by the other, irrelevant
    /// interests.
    #[must_use]
    pub fn best_match(&self, embedding: &[f32]) -> f32 {
        self.vectors
            .values()
            .map(|reference| cosine_similarity(embedding, reference))
            .fold(f32::NEG_INFINITY, f32::max)
    }
}
