//! SIMD overlap kernel using the `wide` crate.
//!
//! Kept boxes are tested eight at a time with `f32x8`. The per-lane arithmetic
//! is the same sequence of min/max/sub/mul/div as [`iou_prepared`], so the
//! decisions match the scalar kernel exactly.
//!
//! [`iou_prepared`]: crate::kernel::iou_prepared

use crate::kernel::{iou_prepared, KeptBoxes, OverlapKernel, PreparedBox};
use wide::f32x8;

const LANES: usize = 8;

/// Load 8 f32 values into f32x8.
#[inline]
fn load_f32x8(slice: &[f32]) -> f32x8 {
    f32x8::from([
        slice[0], slice[1], slice[2], slice[3], slice[4], slice[5], slice[6], slice[7],
    ])
}

/// SIMD kernel comparing eight kept boxes per step.
pub struct SimdOverlap;

impl OverlapKernel for SimdOverlap {
    fn exceeds_any(candidate: &PreparedBox, kept: &KeptBoxes, iou_threshold: f32) -> bool {
        if candidate.area <= 0.0 {
            return false;
        }

        let [ymin, xmin, ymax, xmax, area] = kept.columns();
        let len = kept.len();
        let simd_end = len / LANES * LANES;

        let c_ymin = f32x8::splat(candidate.ymin);
        let c_xmin = f32x8::splat(candidate.xmin);
        let c_ymax = f32x8::splat(candidate.ymax);
        let c_xmax = f32x8::splat(candidate.xmax);
        let c_area = f32x8::splat(candidate.area);
        let zero = f32x8::ZERO;

        let mut idx = 0;
        while idx < simd_end {
            let k_area = load_f32x8(&area[idx..]);
            let inter_h = (c_ymax.min(load_f32x8(&ymax[idx..]))
                - c_ymin.max(load_f32x8(&ymin[idx..])))
            .max(zero);
            let inter_w = (c_xmax.min(load_f32x8(&xmax[idx..]))
                - c_xmin.max(load_f32x8(&xmin[idx..])))
            .max(zero);
            let inter = inter_h * inter_w;
            let iou = (inter / (c_area + k_area - inter)).to_array();
            let areas = k_area.to_array();
            if iou
                .iter()
                .zip(areas.iter())
                .any(|(&v, &a)| a > 0.0 && v > iou_threshold)
            {
                return true;
            }
            idx += LANES;
        }

        // Scalar remainder
        (simd_end..len).any(|i| match kept.get(i) {
            Some(other) => iou_prepared(candidate, &other) > iou_threshold,
            None => false,
        })
    }
}
