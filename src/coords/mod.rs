//! Coordinate conversion from model input space to normalized and pixel space.
//!
//! Boxes arrive as `[x1, y1, x2, y2]` in the model's square `S x S` input.
//! Suppression works on [`NormalizedBox`] (`[y1, x1, y2, x2] / S`), results
//! carry the normalized `[x1, y1, x2, y2] / S` box and an integer pixel box for
//! the destination image. Pixel coordinates are truncated toward zero, never
//! rounded.

use crate::kernel::{iou_prepared, PreparedBox};
use crate::tensor::Candidate;
use crate::util::math::{ordered, scale_trunc};
use crate::util::{DetPostError, DetPostResult};

/// Destination image size in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    width: u32,
    height: u32,
}

impl ImageSize {
    /// Creates a size, rejecting zero dimensions.
    pub fn new(width: u32, height: u32) -> DetPostResult<Self> {
        if width == 0 || height == 0 {
            return Err(DetPostError::InvalidDimensions { width, height });
        }
        Ok(Self { width, height })
    }

    /// Returns the width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Box in `[y1, x1, y2, x2]` order scaled to `[0, 1]`, used for IoU.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NormalizedBox {
    pub y1: f32,
    pub x1: f32,
    pub y2: f32,
    pub x2: f32,
}

impl NormalizedBox {
    /// Creates a box from `[y1, x1, y2, x2]`.
    pub fn from_yxyx(v: [f32; 4]) -> Self {
        Self {
            y1: v[0],
            x1: v[1],
            y2: v[2],
            x2: v[3],
        }
    }

    /// Returns the corners as `(ymin, xmin, ymax, xmax)` regardless of the
    /// order the model reported them in.
    #[inline]
    pub fn extents(&self) -> (f32, f32, f32, f32) {
        let (ymin, ymax) = ordered(self.y1, self.y2);
        let (xmin, xmax) = ordered(self.x1, self.x2);
        (ymin, xmin, ymax, xmax)
    }

    /// Returns the box area.
    #[inline]
    pub fn area(&self) -> f32 {
        PreparedBox::new(self).area
    }
}

/// Intersection over union of two boxes.
///
/// Returns 0 when either box has zero area.
pub fn iou(a: &NormalizedBox, b: &NormalizedBox) -> f32 {
    iou_prepared(&PreparedBox::new(a), &PreparedBox::new(b))
}

/// Converts model-space boxes for a fixed model input size.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateNormalizer {
    input_size: f32,
}

impl CoordinateNormalizer {
    /// Creates a normalizer for an `input_size x input_size` model input.
    pub fn new(input_size: usize) -> DetPostResult<Self> {
        if input_size == 0 {
            return Err(DetPostError::InvalidInput("model input size must be positive"));
        }
        Ok(Self {
            input_size: input_size as f32,
        })
    }

    /// Returns the model input size.
    pub fn input_size(&self) -> f32 {
        self.input_size
    }

    /// Returns the NMS box `[y1, x1, y2, x2] / S` for a candidate.
    pub fn normalized(&self, candidate: &Candidate) -> NormalizedBox {
        let [x1, y1, x2, y2] = candidate.bbox;
        let s = self.input_size;
        NormalizedBox {
            y1: y1 / s,
            x1: x1 / s,
            y2: y2 / s,
            x2: x2 / s,
        }
    }

    /// Returns NMS boxes for a candidate sequence, in the same order.
    pub fn normalize_all(&self, candidates: &[Candidate]) -> Vec<NormalizedBox> {
        candidates.iter().map(|c| self.normalized(c)).collect()
    }

    /// Returns `[x1, y1, x2, y2] / S` for a candidate.
    pub fn box_raw(&self, candidate: &Candidate) -> [f32; 4] {
        let s = self.input_size;
        candidate.bbox.map(|v| v / s)
    }

    /// Returns the candidate box in destination pixels, truncated toward zero.
    pub fn pixel_box(&self, candidate: &Candidate, dest: ImageSize) -> [i32; 4] {
        let s = f64::from(self.input_size);
        let [x1, y1, x2, y2] = candidate.bbox;
        [
            scale_trunc(x1, s, dest.width),
            scale_trunc(y1, s, dest.height),
            scale_trunc(x2, s, dest.width),
            scale_trunc(y2, s, dest.height),
        ]
    }
}
