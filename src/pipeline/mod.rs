//! End-to-end detection post-processing.
//!
//! A [`Detector`] holds an immutable [`DetectConfig`], the model description
//! and its label table. Each call decodes the raw tensor (releasing the
//! buffer), normalizes boxes, runs suppression and assembles labeled
//! detections. Calls share no mutable state, so one detector can serve many
//! threads.

mod runner;

pub use runner::ModelRunner;

use std::time::Instant;

use crate::assemble::{Detection, ResultAssembler};
use crate::candidate::nms::{NmsParams, SuppressionEngine};
use crate::coords::{CoordinateNormalizer, ImageSize};
use crate::labels::LabelTable;
use crate::tensor::DetectionTensor;
use crate::trace::{trace_event, trace_span};
use crate::util::{DetPostError, DetPostResult};

/// Whether suppression compares boxes across classes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SuppressionMode {
    /// Any kept box suppresses overlapping lower-scoring boxes of any class.
    #[default]
    ClassAgnostic,
    /// Boxes only suppress boxes of the same class.
    PerClass,
}

/// Configuration for one detector.
#[derive(Clone, Debug, PartialEq)]
pub struct DetectConfig {
    /// Candidates scoring below this are discarded.
    pub min_score: f32,
    /// IoU above which a lower-scoring overlapping box is suppressed.
    pub iou_threshold: f32,
    /// Maximum number of detections returned.
    pub max_results: usize,
    /// Cross-class or per-class suppression.
    pub suppression: SuppressionMode,
    /// Parallel IoU tests for large kept sets (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            min_score: 0.10,
            iou_threshold: 0.40,
            max_results: 20,
            suppression: SuppressionMode::ClassAgnostic,
            parallel: false,
        }
    }
}

impl DetectConfig {
    /// Returns the suppression parameters for this configuration.
    pub fn nms_params(&self) -> NmsParams {
        NmsParams {
            min_score: self.min_score,
            iou_threshold: self.iou_threshold,
            max_results: self.max_results,
            parallel: self.parallel,
        }
    }

    /// Checks threshold ranges.
    pub fn validate(&self) -> DetPostResult<()> {
        self.nms_params().validate()
    }
}

/// Model properties the post-processing depends on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    /// Side length of the square model input, in pixels.
    pub input_size: usize,
    /// Number of classes the model predicts.
    pub num_classes: usize,
}

/// Reusable detection post-processor.
#[derive(Clone, Debug)]
pub struct Detector {
    model: ModelSpec,
    labels: LabelTable,
    config: DetectConfig,
    normalizer: CoordinateNormalizer,
    engine: SuppressionEngine,
}

impl Detector {
    /// Creates a detector with the default configuration.
    ///
    /// Fails with [`DetPostError::LabelCountMismatch`] when the label table
    /// does not have one entry per model class.
    pub fn new(model: ModelSpec, labels: LabelTable) -> DetPostResult<Self> {
        labels.validate_class_count(model.num_classes)?;
        let config = DetectConfig::default();
        Ok(Self {
            model,
            labels,
            normalizer: CoordinateNormalizer::new(model.input_size)?,
            engine: SuppressionEngine::new(config.nms_params())?,
            config,
        })
    }

    /// Creates a detector for the model behind a runner.
    pub fn from_runner<R: ModelRunner>(runner: &R, labels: LabelTable) -> DetPostResult<Self> {
        Self::new(
            ModelSpec {
                input_size: runner.input_size(),
                num_classes: runner.num_classes(),
            },
            labels,
        )
    }

    /// Replaces the configuration after validating it.
    pub fn with_config(mut self, config: DetectConfig) -> DetPostResult<Self> {
        self.engine = SuppressionEngine::new(config.nms_params())?;
        self.config = config;
        Ok(self)
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    /// Returns the model description.
    pub fn model(&self) -> ModelSpec {
        self.model
    }

    /// Returns the label table.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Post-processes an owned raw tensor for a destination image.
    ///
    /// The buffer is consumed and released during decoding, before
    /// suppression runs, on success and on error.
    pub fn detect<B: AsRef<[f32]>>(
        &self,
        raw: B,
        dest: ImageSize,
    ) -> DetPostResult<Vec<Detection>> {
        self.traced(dest, || DetectionTensor::decode(raw))
    }

    /// Like [`Detector::detect`], validating a declared `[1, N, 6]` shape first.
    pub fn detect_shaped<B: AsRef<[f32]>>(
        &self,
        raw: B,
        shape: &[usize],
        dest: ImageSize,
    ) -> DetPostResult<Vec<Detection>> {
        self.traced(dest, || DetectionTensor::decode_shaped(raw, shape))
    }

    fn traced<F>(&self, dest: ImageSize, decode: F) -> DetPostResult<Vec<Detection>>
    where
        F: FnOnce() -> DetPostResult<DetectionTensor>,
    {
        let _span = trace_span!("detect").entered();
        let start = Instant::now();
        let tensor = decode()?;
        let out = self.detect_decoded(&tensor, dest)?;
        trace_event!(
            "detect_done",
            detections = out.len(),
            elapsed_us = start.elapsed().as_micros() as u64
        );
        Ok(out)
    }

    /// Post-processes an already decoded tensor.
    pub fn detect_decoded(
        &self,
        tensor: &DetectionTensor,
        dest: ImageSize,
    ) -> DetPostResult<Vec<Detection>> {
        let candidates = tensor.candidates();
        let boxes = self.normalizer.normalize_all(candidates);
        let scores = tensor.scores();
        let survivors = match self.config.suppression {
            SuppressionMode::ClassAgnostic => self.engine.suppress(&boxes, &scores)?,
            SuppressionMode::PerClass => {
                let classes: Vec<u32> = candidates.iter().map(|c| c.class_id).collect();
                self.engine.suppress_by_class(&boxes, &scores, &classes)?
            }
        };
        ResultAssembler::new(self.normalizer, &self.labels, dest).assemble(&survivors, candidates)
    }

    /// Executes the model through `runner` and post-processes its output.
    pub fn run<R: ModelRunner>(
        &self,
        runner: &R,
        input: &R::Input,
        dest: ImageSize,
    ) -> DetPostResult<Vec<Detection>> {
        if runner.input_size() != self.model.input_size {
            return Err(DetPostError::InvalidConfig(
                "runner input size differs from the detector model",
            ));
        }
        self.labels.validate_class_count(runner.num_classes())?;
        let raw = runner
            .execute(input)
            .map_err(|err| DetPostError::ModelExecution {
                reason: err.to_string(),
            })?;
        self.detect(raw, dest)
    }
}
