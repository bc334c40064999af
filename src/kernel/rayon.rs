//! Rayon-parallel overlap kernel (feature-gated).
//!
//! Kept boxes are immutable while a candidate is tested, so the pairwise IoU
//! checks run in parallel without locking. The kernel short-circuits as soon as
//! any worker finds an overlap above the threshold.

use crate::kernel::{iou_prepared, KeptBoxes, OverlapKernel, PreparedBox};
use rayon::prelude::*;

/// Kept-set size below which the sequential path is used instead.
pub const PAR_MIN_KEPT: usize = 64;

/// Parallel kernel splitting the kept set across the rayon pool.
pub struct RayonOverlap;

impl OverlapKernel for RayonOverlap {
    fn exceeds_any(candidate: &PreparedBox, kept: &KeptBoxes, iou_threshold: f32) -> bool {
        if candidate.area <= 0.0 {
            return false;
        }
        (0..kept.len())
            .into_par_iter()
            .any(|idx| match kept.get(idx) {
                Some(other) => iou_prepared(candidate, &other) > iou_threshold,
                None => false,
            })
    }
}
