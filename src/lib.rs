//! detpost turns raw object-detection tensors into labeled, non-overlapping
//! boxes in destination image coordinates.
//!
//! The pipeline decodes a flat `[1, N, 6]` tensor, normalizes coordinates,
//! runs greedy class-agnostic IoU suppression and attaches labels. Optional
//! features add a `rayon` IoU kernel, a `wide` SIMD kernel, `tracing` spans and
//! `image` based overlays.

pub mod assemble;
mod candidate;
pub mod coords;
#[cfg(feature = "image-io")]
pub mod io;
pub mod kernel;
pub mod labels;
pub mod lowlevel;
pub mod pipeline;
pub mod tensor;
mod trace;
pub mod util;

pub use assemble::{Detection, ResultAssembler};
pub use coords::{iou, CoordinateNormalizer, ImageSize, NormalizedBox};
pub use labels::LabelTable;
pub use pipeline::{DetectConfig, Detector, ModelRunner, ModelSpec, SuppressionMode};
pub use tensor::{Candidate, DecodeIssue, DetectionTensor, DroppedCandidate, CANDIDATE_STRIDE};
pub use util::{DetPostError, DetPostResult, ErrorKind};

pub use candidate::nms::{non_max_suppression, NmsParams, SuppressionEngine};
