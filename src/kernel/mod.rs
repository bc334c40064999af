//! Overlap kernels used by greedy suppression.
//!
//! Each kernel answers one question: does a candidate box overlap any
//! already-kept box with IoU above the threshold? Kept boxes are stored in
//! structure-of-arrays form so the SIMD kernel can load eight at a time. All
//! kernels evaluate the same per-pair formula as [`iou_prepared`] and return
//! identical decisions.

use crate::coords::NormalizedBox;

/// Box with ordered corners and a cached area.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PreparedBox {
    pub ymin: f32,
    pub xmin: f32,
    pub ymax: f32,
    pub xmax: f32,
    pub area: f32,
}

impl PreparedBox {
    /// Orders the corners of a normalized box and caches its area.
    #[inline]
    pub fn new(b: &NormalizedBox) -> Self {
        let (ymin, xmin, ymax, xmax) = b.extents();
        Self {
            ymin,
            xmin,
            ymax,
            xmax,
            area: (ymax - ymin) * (xmax - xmin),
        }
    }
}

/// IoU of two prepared boxes; 0 when either has zero area.
#[inline]
pub fn iou_prepared(a: &PreparedBox, b: &PreparedBox) -> f32 {
    if a.area <= 0.0 || b.area <= 0.0 {
        return 0.0;
    }
    let inter_h = (a.ymax.min(b.ymax) - a.ymin.max(b.ymin)).max(0.0);
    let inter_w = (a.xmax.min(b.xmax) - a.xmin.max(b.xmin)).max(0.0);
    let inter = inter_h * inter_w;
    inter / (a.area + b.area - inter)
}

/// Boxes accepted so far, stored column-wise.
#[derive(Clone, Debug, Default)]
pub struct KeptBoxes {
    ymin: Vec<f32>,
    xmin: Vec<f32>,
    ymax: Vec<f32>,
    xmax: Vec<f32>,
    area: Vec<f32>,
}

impl KeptBoxes {
    /// Creates an empty set with room for `capacity` boxes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            ymin: Vec::with_capacity(capacity),
            xmin: Vec::with_capacity(capacity),
            ymax: Vec::with_capacity(capacity),
            xmax: Vec::with_capacity(capacity),
            area: Vec::with_capacity(capacity),
        }
    }

    /// Appends a kept box.
    pub fn push(&mut self, b: PreparedBox) {
        self.ymin.push(b.ymin);
        self.xmin.push(b.xmin);
        self.ymax.push(b.ymax);
        self.xmax.push(b.xmax);
        self.area.push(b.area);
    }

    /// Returns the kept box at `idx`.
    pub fn get(&self, idx: usize) -> Option<PreparedBox> {
        Some(PreparedBox {
            ymin: *self.ymin.get(idx)?,
            xmin: *self.xmin.get(idx)?,
            ymax: *self.ymax.get(idx)?,
            xmax: *self.xmax.get(idx)?,
            area: *self.area.get(idx)?,
        })
    }

    /// Returns the number of kept boxes.
    pub fn len(&self) -> usize {
        self.area.len()
    }

    /// Returns true when nothing has been kept.
    pub fn is_empty(&self) -> bool {
        self.area.is_empty()
    }

    #[cfg_attr(not(feature = "simd"), allow(dead_code))]
    pub(crate) fn columns(&self) -> [&[f32]; 5] {
        [
            self.ymin.as_slice(),
            self.xmin.as_slice(),
            self.ymax.as_slice(),
            self.xmax.as_slice(),
            self.area.as_slice(),
        ]
    }
}

/// Kernel trait for candidate-versus-kept overlap tests.
pub trait OverlapKernel {
    /// Returns true if `candidate` has IoU strictly greater than
    /// `iou_threshold` with any box in `kept`.
    fn exceeds_any(candidate: &PreparedBox, kept: &KeptBoxes, iou_threshold: f32) -> bool;
}

pub mod scalar;

#[cfg(feature = "simd")]
pub mod simd;

#[cfg(feature = "rayon")]
pub mod rayon;
