//! Class id to label lookup.
//!
//! A [`LabelTable`] must have exactly one entry per model class. A length
//! mismatch is a configuration error caught when the detector is built, and a
//! class id past the end is reported as [`DetPostError::ClassOutOfRange`];
//! ids are never wrapped or clamped.

use crate::util::{DetPostError, DetPostResult};

mod coco;

/// Ordered mapping from class id to label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LabelTable {
    labels: Vec<String>,
}

impl LabelTable {
    /// Creates a table from labels ordered by class id.
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses one label per line, trimming whitespace and skipping blank lines.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().map(str::trim).filter(|line| !line.is_empty()))
    }

    /// The 80 COCO class names in model order.
    pub fn coco() -> Self {
        Self::new(coco::COCO_LABELS.iter().copied())
    }

    /// Returns the number of labels.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Returns true when the table has no labels.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the label for `class_id`, if present.
    pub fn get(&self, class_id: u32) -> Option<&str> {
        self.labels.get(class_id as usize).map(String::as_str)
    }

    /// Returns the label for `class_id` or a configuration error.
    pub fn label(&self, class_id: u32) -> DetPostResult<&str> {
        self.get(class_id).ok_or(DetPostError::ClassOutOfRange {
            class_id,
            len: self.labels.len(),
        })
    }

    /// Checks that the table covers exactly `num_classes` classes.
    pub fn validate_class_count(&self, num_classes: usize) -> DetPostResult<()> {
        if self.labels.len() != num_classes {
            return Err(DetPostError::LabelCountMismatch {
                labels: self.labels.len(),
                classes: num_classes,
            });
        }
        Ok(())
    }

    /// Iterates labels in class id order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}
