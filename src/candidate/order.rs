//! Deterministic score ordering for candidate positions.

use std::cmp::Ordering;

// Only called on filtered positions, so no NaN reaches `partial_cmp`; `-0.0`
// and `0.0` compare equal and fall through to the position tie-break.
fn score_cmp_desc(scores: &[f32], a: usize, b: usize) -> Ordering {
    scores[b]
        .partial_cmp(&scores[a])
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.cmp(&b))
}

/// Returns positions with `score >= min_score`, sorted by descending score
/// with ties broken by ascending position.
///
/// NaN scores never pass the filter.
pub(crate) fn ranked_above(scores: &[f32], min_score: f32) -> Vec<usize> {
    let mut order: Vec<usize> = scores
        .iter()
        .enumerate()
        .filter(|(_, score)| **score >= min_score)
        .map(|(pos, _)| pos)
        .collect();
    order.sort_by(|&a, &b| score_cmp_desc(scores, a, b));
    order
}
