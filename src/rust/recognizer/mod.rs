mod builder;
mod recognizer;

pub use builder::{FaceSample, RecognizerBuilder};
pub use recognizer::Recognizer;

use crate::pipeline::PipelineConfig;

/// Information about a trained recognizer
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerInfo {
    /// Number of identities the recognizer was trained on
    pub num_classes: usize,
    /// Identity strings in label-index order
    pub class_labels: Vec<String>,
    /// Length of the feature vectors the model expects
    pub feature_dimension: usize,
    /// Regularization parameter chosen during training
    pub regularization: f64,
    /// Descriptor and normalization settings used for every face
    pub config: PipelineConfig,
}
