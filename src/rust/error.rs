use thiserror::Error;

/// Represents the different types of errors that can occur while describing
/// faces or training and querying the recognizer.
#[derive(Error, Debug)]
pub enum FaceError {
    /// The descriptor only works on single-channel images of a supported sample type
    #[error("Unsupported pixel format: {format} with {channels} channel(s), expected a single-channel image")]
    UnsupportedPixelFormat { channels: usize, format: &'static str },

    /// No face region was available for the image
    #[error("No face region detected")]
    EmptyDetection,

    /// Training needs samples from at least two identities
    #[error("Insufficient labels: found {found} distinct label(s), need at least 2")]
    InsufficientLabels { found: usize },

    #[error("Training set is empty")]
    EmptyTrainingSet,

    /// A feature vector does not have the dimension the model was trained with
    #[error("Dimension mismatch: expected {expected} features, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Unknown label index: {0}")]
    UnknownLabel(usize),

    /// Invalid configuration or input parameters
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The SVM solver failed to fit a pairwise model
    #[error("Training error: {0}")]
    Training(String),

    /// The worker pool could not be created
    #[error("Runtime error: {0}")]
    Runtime(String),
}

pub type Result<T> = std::result::Result<T, FaceError>;
