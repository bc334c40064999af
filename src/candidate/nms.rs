//! Greedy IoU non-maximum suppression.
//!
//! Candidates below `min_score` are discarded first. The rest are visited in
//! descending score order (ties by ascending position) and kept unless their
//! IoU with an already-kept box exceeds `iou_threshold`. Visiting stops once
//! `max_results` boxes are kept. Cost is O(K * kept) where K is the number of
//! candidates passing the score filter.

use std::collections::HashMap;

use crate::candidate::order::ranked_above;
use crate::coords::NormalizedBox;
#[cfg(feature = "rayon")]
use crate::kernel::rayon::{RayonOverlap, PAR_MIN_KEPT};
use crate::kernel::{KeptBoxes, OverlapKernel, PreparedBox};
use crate::trace::{trace_event, trace_span};
use crate::util::{DetPostError, DetPostResult};

// Sequential kernel - use SIMD when available
#[cfg(not(feature = "simd"))]
use crate::kernel::scalar::ScalarOverlap as SeqOverlap;
#[cfg(feature = "simd")]
use crate::kernel::simd::SimdOverlap as SeqOverlap;

/// Parameters for greedy suppression.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NmsParams {
    /// Candidates scoring below this are discarded before suppression.
    pub min_score: f32,
    /// A candidate is suppressed when its IoU with a kept box exceeds this.
    pub iou_threshold: f32,
    /// Maximum number of kept boxes.
    pub max_results: usize,
    /// Use the rayon kernel for large kept sets (requires the `rayon` feature).
    pub parallel: bool,
}

impl NmsParams {
    /// Checks that both thresholds lie in `[0, 1]`.
    pub fn validate(&self) -> DetPostResult<()> {
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(DetPostError::InvalidConfig("min_score must be within [0, 1]"));
        }
        if !(0.0..=1.0).contains(&self.iou_threshold) {
            return Err(DetPostError::InvalidConfig(
                "iou_threshold must be within [0, 1]",
            ));
        }
        Ok(())
    }
}

/// Greedy NMS over normalized boxes.
#[derive(Clone, Copy, Debug)]
pub struct SuppressionEngine {
    params: NmsParams,
}

impl SuppressionEngine {
    /// Creates an engine after validating its parameters.
    pub fn new(params: NmsParams) -> DetPostResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Returns the engine parameters.
    pub fn params(&self) -> &NmsParams {
        &self.params
    }

    /// Class-agnostic suppression: any kept box can suppress any candidate.
    ///
    /// Returns surviving positions in selection order.
    pub fn suppress(&self, boxes: &[NormalizedBox], scores: &[f32]) -> DetPostResult<Vec<usize>> {
        if boxes.len() != scores.len() {
            return Err(DetPostError::InvalidInput(
                "boxes and scores must have the same length",
            ));
        }
        Ok(self.run(boxes, scores, |_| 0))
    }

    /// Per-class suppression: a kept box only suppresses candidates with the
    /// same class id.
    pub fn suppress_by_class(
        &self,
        boxes: &[NormalizedBox],
        scores: &[f32],
        classes: &[u32],
    ) -> DetPostResult<Vec<usize>> {
        if boxes.len() != scores.len() || boxes.len() != classes.len() {
            return Err(DetPostError::InvalidInput(
                "boxes, scores and classes must have the same length",
            ));
        }
        Ok(self.run(boxes, scores, |pos| classes[pos]))
    }

    fn run<G>(&self, boxes: &[NormalizedBox], scores: &[f32], group_of: G) -> Vec<usize>
    where
        G: Fn(usize) -> u32,
    {
        let params = &self.params;
        if params.max_results == 0 {
            return Vec::new();
        }

        let _span = trace_span!("suppress", candidates = boxes.len()).entered();

        let order = ranked_above(scores, params.min_score);
        let check_overlap = params.iou_threshold < 1.0;
        let mut groups: HashMap<u32, KeptBoxes> = HashMap::new();
        let mut kept = Vec::with_capacity(params.max_results.min(order.len()));

        for pos in order.iter().copied() {
            let candidate = PreparedBox::new(&boxes[pos]);
            let group = groups.entry(group_of(pos)).or_default();
            if check_overlap && self.exceeds_any(&candidate, group) {
                continue;
            }
            group.push(candidate);
            kept.push(pos);
            if kept.len() == params.max_results {
                break;
            }
        }

        trace_event!(
            "suppressed",
            above_min_score = order.len(),
            kept = kept.len()
        );
        kept
    }

    fn exceeds_any(&self, candidate: &PreparedBox, kept: &KeptBoxes) -> bool {
        #[cfg(feature = "rayon")]
        if self.params.parallel && kept.len() >= PAR_MIN_KEPT {
            return RayonOverlap::exceeds_any(candidate, kept, self.params.iou_threshold);
        }
        SeqOverlap::exceeds_any(candidate, kept, self.params.iou_threshold)
    }
}

/// Class-agnostic greedy NMS in one call.
///
/// Convenience wrapper around [`SuppressionEngine::suppress`].
pub fn non_max_suppression(
    boxes: &[NormalizedBox],
    scores: &[f32],
    params: NmsParams,
) -> DetPostResult<Vec<usize>> {
    SuppressionEngine::new(params)?.suppress(boxes, scores)
}
