//! Cosine similarity over raw embedding vectors.

/// Cosine similarity between two vectors.
///
/// The result lies in `[-1.0, 1.0]` for any non-degenerate input; this is a
/// property of the formula, not a runtime clamp. Negative similarities are
/// legitimate low scores and are deliberately not clamped -- masking them
/// would hide upstream embedding errors. The pipeline's exposed relevance
/// score lying in `[0.0, 1.0]` is an invariant of the embedding space
/// (vectors from the same model family point into the same half-space),
/// documented here rather than enforced.
///
/// Returns `0.0` when either vector has zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vector dimensions must match");
    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
