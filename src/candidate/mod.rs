//! Candidate ranking and suppression.
//!
//! Includes deterministic score ordering and greedy IoU non-maximum
//! suppression.

pub(crate) mod nms;
mod order;
