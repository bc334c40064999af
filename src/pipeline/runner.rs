//! Boundary to the external inference engine.

use std::fmt::Display;

/// An inference engine producing raw detection tensors.
///
/// Implementations wrap whatever runtime executes the model. Any asynchrony
/// belongs to the implementation; [`Detector::run`] calls `execute` and waits
/// for its result.
///
/// [`Detector::run`]: crate::Detector::run
pub trait ModelRunner {
    /// Preprocessed model input, e.g. an `S x S` image tensor.
    type Input;
    /// Flat `[1, N, 6]` output buffer, handed to the detector by value.
    type Output: AsRef<[f32]>;
    /// Runner failure, reported through [`DetPostError::ModelExecution`].
    ///
    /// [`DetPostError::ModelExecution`]: crate::DetPostError::ModelExecution
    type Error: Display;

    /// Side length of the square model input.
    fn input_size(&self) -> usize;

    /// Number of classes the model predicts.
    fn num_classes(&self) -> usize;

    /// Runs the model on one input.
    fn execute(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}
