//! Final result assembly.
//!
//! Maps surviving positions back to decoded candidates, attaches labels and
//! produces both normalized and destination-pixel boxes. Detections own their
//! data and hold no reference back into the tensor.

use crate::coords::{CoordinateNormalizer, ImageSize};
use crate::labels::LabelTable;
use crate::tensor::Candidate;
use crate::util::{DetPostError, DetPostResult};

/// A labeled detection in destination image coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Row index of the originating candidate in the raw tensor.
    pub id: usize,
    /// Confidence score.
    pub score: f32,
    /// Class id.
    pub class_id: u32,
    /// Class label.
    pub label: String,
    /// `[x1, y1, x2, y2]` in destination pixels, truncated toward zero.
    pub bbox: [i32; 4],
    /// `[x1, y1, x2, y2]` normalized to `[0, 1]`.
    pub bbox_raw: [f32; 4],
}

impl Detection {
    /// Overlay caption such as `"87% dog"`.
    pub fn caption(&self) -> String {
        format!("{}% {}", (100.0 * self.score).round() as i32, self.label)
    }

    /// Width of the pixel box.
    pub fn width(&self) -> i32 {
        self.bbox[2] - self.bbox[0]
    }

    /// Height of the pixel box.
    pub fn height(&self) -> i32 {
        self.bbox[3] - self.bbox[1]
    }
}

/// Builds [`Detection`]s from suppression survivors.
#[derive(Clone, Copy, Debug)]
pub struct ResultAssembler<'a> {
    normalizer: CoordinateNormalizer,
    labels: &'a LabelTable,
    dest: ImageSize,
}

impl<'a> ResultAssembler<'a> {
    /// Creates an assembler for one destination image.
    pub fn new(normalizer: CoordinateNormalizer, labels: &'a LabelTable, dest: ImageSize) -> Self {
        Self {
            normalizer,
            labels,
            dest,
        }
    }

    /// Assembles detections in survivor order.
    ///
    /// Fails with [`DetPostError::ClassOutOfRange`] when a survivor's class id
    /// has no label.
    pub fn assemble(
        &self,
        survivors: &[usize],
        candidates: &[Candidate],
    ) -> DetPostResult<Vec<Detection>> {
        let mut out = Vec::with_capacity(survivors.len());
        for &pos in survivors {
            let candidate = candidates.get(pos).ok_or(DetPostError::InvalidInput(
                "survivor index out of range for candidates",
            ))?;
            out.push(self.detection(candidate)?);
        }
        Ok(out)
    }

    fn detection(&self, candidate: &Candidate) -> DetPostResult<Detection> {
        let label = self.labels.label(candidate.class_id)?;
        Ok(Detection {
            id: candidate.index,
            score: candidate.score,
            class_id: candidate.class_id,
            label: label.to_owned(),
            bbox: self.normalizer.pixel_box(candidate, self.dest),
            bbox_raw: self.normalizer.box_raw(candidate),
        })
    }
}
