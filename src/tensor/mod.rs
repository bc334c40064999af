//! Raw detection tensor decoding.
//!
//! The model emits a flat `f32` buffer logically shaped `[1, N, 6]` where each
//! row is `(x1, y1, x2, y2, score, class_id)` in model input-pixel space.
//! [`DetectionTensor::decode`] takes ownership of that buffer, copies each row
//! into a typed [`Candidate`], and releases the buffer before returning on
//! every path. Rows with unusable values are dropped individually and recorded
//! as [`DroppedCandidate`]s rather than failing the whole batch.

use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::as_class_id;
use crate::util::{DetPostError, DetPostResult};

/// Number of values per candidate row.
pub const CANDIDATE_STRIDE: usize = 6;

/// One decoded detection hypothesis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Candidate {
    /// Row index in the raw tensor.
    pub index: usize,
    /// `[x1, y1, x2, y2]` in model input-pixel space.
    pub bbox: [f32; 4],
    /// Confidence score.
    pub score: f32,
    /// Class id reported by the model.
    pub class_id: u32,
}

/// Reason a candidate row was dropped during decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeIssue {
    /// The score is NaN or infinite.
    NonFiniteScore,
    /// The class field is NaN or infinite.
    NonFiniteClass,
    /// The class field is negative or not a whole number.
    InvalidClass,
    /// A box coordinate is NaN or infinite.
    NonFiniteBox,
}

impl DecodeIssue {
    /// Short machine-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DecodeIssue::NonFiniteScore => "non_finite_score",
            DecodeIssue::NonFiniteClass => "non_finite_class",
            DecodeIssue::InvalidClass => "invalid_class",
            DecodeIssue::NonFiniteBox => "non_finite_box",
        }
    }
}

/// A row that was skipped during decoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DroppedCandidate {
    /// Row index in the raw tensor.
    pub index: usize,
    /// Why the row was dropped.
    pub issue: DecodeIssue,
}

/// Ordered, immutable candidates decoded from one inference call.
#[derive(Clone, Debug, Default)]
pub struct DetectionTensor {
    candidates: Vec<Candidate>,
    dropped: Vec<DroppedCandidate>,
    rows: usize,
}

impl DetectionTensor {
    /// Decodes an owned buffer, releasing it once the values are copied out.
    ///
    /// The buffer is dropped before this function returns, whether decoding
    /// succeeds or fails.
    pub fn decode<B: AsRef<[f32]>>(buffer: B) -> DetPostResult<Self> {
        let decoded = Self::decode_slice(buffer.as_ref());
        drop(buffer);
        decoded
    }

    /// Decodes an owned buffer after validating its declared logical shape.
    ///
    /// Accepted shapes are `[1, N, 6]` and `[N, 6]`.
    pub fn decode_shaped<B: AsRef<[f32]>>(buffer: B, shape: &[usize]) -> DetPostResult<Self> {
        let checked = check_shape(buffer.as_ref().len(), shape);
        let decoded = checked.and_then(|()| Self::decode_slice(buffer.as_ref()));
        drop(buffer);
        decoded
    }

    /// Decodes a borrowed buffer.
    pub fn decode_slice(data: &[f32]) -> DetPostResult<Self> {
        if data.len() % CANDIDATE_STRIDE != 0 {
            return Err(DetPostError::TensorShape {
                len: data.len(),
                stride: CANDIDATE_STRIDE,
            });
        }

        let rows = data.len() / CANDIDATE_STRIDE;
        let _span = trace_span!("decode", rows = rows).entered();

        let mut candidates = Vec::with_capacity(rows);
        let mut dropped = Vec::new();
        for (index, row) in data.chunks_exact(CANDIDATE_STRIDE).enumerate() {
            match decode_row(index, row) {
                Ok(candidate) => candidates.push(candidate),
                Err(issue) => {
                    trace_warn!("candidate_dropped", index = index, issue = issue.as_str());
                    dropped.push(DroppedCandidate { index, issue });
                }
            }
        }

        if rows > 0 && candidates.is_empty() {
            return Err(DetPostError::NoValidCandidates { total: rows });
        }

        trace_event!(
            "decoded",
            candidates = candidates.len(),
            dropped = dropped.len()
        );
        Ok(Self {
            candidates,
            dropped,
            rows,
        })
    }

    /// Returns the decoded candidates in tensor order.
    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Returns the candidate at a position in the decoded sequence.
    pub fn get(&self, pos: usize) -> Option<&Candidate> {
        self.candidates.get(pos)
    }

    /// Returns the number of decoded candidates.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    /// Returns true when no candidate was decoded.
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// Returns the rows that were dropped during decoding.
    pub fn dropped(&self) -> &[DroppedCandidate] {
        &self.dropped
    }

    /// Returns the number of rows in the raw tensor.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the scores of the decoded candidates in order.
    pub fn scores(&self) -> Vec<f32> {
        self.candidates.iter().map(|c| c.score).collect()
    }
}

fn decode_row(index: usize, row: &[f32]) -> Result<Candidate, DecodeIssue> {
    let score = row[4];
    if !score.is_finite() {
        return Err(DecodeIssue::NonFiniteScore);
    }
    let class_raw = row[5];
    if !class_raw.is_finite() {
        return Err(DecodeIssue::NonFiniteClass);
    }
    let class_id = as_class_id(class_raw).ok_or(DecodeIssue::InvalidClass)?;
    let bbox = [row[0], row[1], row[2], row[3]];
    if bbox.iter().any(|v| !v.is_finite()) {
        return Err(DecodeIssue::NonFiniteBox);
    }
    Ok(Candidate {
        index,
        bbox,
        score,
        class_id,
    })
}

fn check_shape(len: usize, shape: &[usize]) -> DetPostResult<()> {
    let rows = match shape {
        [1, rows, CANDIDATE_STRIDE] | [rows, CANDIDATE_STRIDE] => *rows,
        _ => {
            return Err(DetPostError::ShapeMismatch {
                expected: format!("[1, N, {CANDIDATE_STRIDE}]"),
                got: format!("{shape:?}"),
            })
        }
    };
    let needed = rows
        .checked_mul(CANDIDATE_STRIDE)
        .ok_or(DetPostError::InvalidInput("tensor shape overflows"))?;
    if needed != len {
        return Err(DetPostError::ShapeMismatch {
            expected: format!("{needed} values"),
            got: format!("{len} values"),
        });
    }
    Ok(())
}
