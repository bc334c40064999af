//! Scalar reference overlap kernel.

use crate::kernel::{iou_prepared, KeptBoxes, OverlapKernel, PreparedBox};

/// Scalar kernel comparing one kept box at a time.
pub struct ScalarOverlap;

impl OverlapKernel for ScalarOverlap {
    fn exceeds_any(candidate: &PreparedBox, kept: &KeptBoxes, iou_threshold: f32) -> bool {
        if candidate.area <= 0.0 {
            return false;
        }
        (0..kept.len()).any(|idx| match kept.get(idx) {
            Some(other) => iou_prepared(candidate, &other) > iou_threshold,
            None => false,
        })
    }
}
