//! Low-level building blocks for custom post-processing pipelines.
//!
//! These re-exports expose the suppression engine and overlap kernels for
//! callers that decode or assemble results themselves. Most users should
//! prefer [`Detector`](crate::Detector).

pub use crate::candidate::nms::{non_max_suppression, NmsParams, SuppressionEngine};
pub use crate::kernel::scalar::ScalarOverlap;
pub use crate::kernel::{iou_prepared, KeptBoxes, OverlapKernel, PreparedBox};

#[cfg(feature = "rayon")]
pub use crate::kernel::rayon::RayonOverlap;
#[cfg(feature = "simd")]
pub use crate::kernel::simd::SimdOverlap;
