use serde::{Deserialize, Serialize};

use super::builder::RecognizerBuilder;
use super::RecognizerInfo;
use crate::classifier::{LabelDictionary, SvmModel};
use crate::error::{FaceError, Result};
use crate::histogram::FeatureVector;
use crate::pipeline::{extract_features, locate_face, FaceDetector, PipelineConfig};
use crate::raster::Image;

/// A trained face recognizer.
///
/// Bundles the linear SVM with the label dictionary and the pipeline
/// configuration it was trained with, so that every prediction runs the
/// exact descriptor and normalization steps used during training.
///
/// # Thread Safety
///
/// `Recognizer` is read-only after training and is `Send + Sync`; wrap it in
/// an `Arc` to predict from several threads.
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use lbpface::{Image, Recognizer};
///
/// let stripes = |period: u32| Image::from_fn(40, 40, move |x, _| if (x / period) % 2 == 0 { 30u8 } else { 220 });
/// let recognizer = Recognizer::builder()
///     .with_grid(2, 2)
///     .add_sample(stripes(2), "narrow")?
///     .add_sample(stripes(8), "wide")?
///     .build()?;
///
/// let name = recognizer.predict(&stripes(2))?;
/// println!("Recognized: {}", name);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredRecognizer")]
pub struct Recognizer {
    pub(crate) config: PipelineConfig,
    pub(crate) model: SvmModel,
    pub(crate) labels: LabelDictionary,
}

/// Serialized parts of a [`Recognizer`], checked by [`Recognizer::from_parts`] on load.
#[derive(Deserialize)]
struct StoredRecognizer {
    config: PipelineConfig,
    model: SvmModel,
    labels: LabelDictionary,
}

impl TryFrom<StoredRecognizer> for Recognizer {
    type Error = FaceError;

    fn try_from(stored: StoredRecognizer) -> Result<Self> {
        Recognizer::from_parts(stored.config, stored.model, stored.labels)
    }
}

// Compile-time verification of thread-safety
const _: () = {
    fn assert_send_sync<T: Send + Sync>() {}
    fn verify_thread_safety() {
        assert_send_sync::<Recognizer>();
    }
};

impl Recognizer {
    /// Creates a new RecognizerBuilder for fluent construction
    pub fn builder() -> RecognizerBuilder {
        RecognizerBuilder::new()
    }

    /// Reassembles a recognizer from separately stored parts.
    ///
    /// # Errors
    /// - `InvalidParameter` if `config` is invalid or `labels` does not cover
    ///   every label the model can predict
    /// - `DimensionMismatch` if the model's dimension does not match `config`
    ///   or a hyperplane does not match the model's dimension
    pub fn from_parts(
        config: PipelineConfig,
        model: SvmModel,
        labels: LabelDictionary,
    ) -> Result<Self> {
        config.validate()?;
        model.validate()?;
        if model.dimension() != config.feature_length() {
            return Err(FaceError::DimensionMismatch {
                expected: config.feature_length(),
                found: model.dimension(),
            });
        }
        if labels.len() < model.num_classes() {
            return Err(FaceError::InvalidParameter(format!(
                "Label dictionary has {} entries but the model predicts {} labels",
                labels.len(),
                model.num_classes()
            )));
        }
        Ok(Self {
            config,
            model,
            labels,
        })
    }

    /// Returns information about the recognizer's current state
    pub fn info(&self) -> RecognizerInfo {
        RecognizerInfo {
            num_classes: self.labels.len(),
            class_labels: self.labels.labels().to_vec(),
            feature_dimension: self.model.dimension(),
            regularization: self.model.c(),
            config: self.config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn model(&self) -> &SvmModel {
        &self.model
    }

    pub fn labels(&self) -> &LabelDictionary {
        &self.labels
    }

    /// Computes the feature vector of a face region with the trained configuration.
    pub fn extract_features(&self, face: &Image) -> Result<FeatureVector> {
        extract_features(face, &self.config)
    }

    /// Predicts the label index of a feature vector.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `features` was built with a different configuration
    pub fn predict_index(&self, features: &FeatureVector) -> Result<usize> {
        self.model.predict(features)
    }

    /// Predicts the identity of a feature vector.
    pub fn predict_features(&self, features: &FeatureVector) -> Result<&str> {
        let index = self.predict_index(features)?;
        self.labels.resolve(index)
    }

    /// Predicts the identity of an already located face region.
    ///
    /// # Arguments
    /// * `face` - A single-channel face crop of any size; it is resized to the
    ///   canonical face size before description
    ///
    /// # Returns
    /// The identity string registered for the predicted label
    ///
    /// # Errors
    /// - `UnsupportedPixelFormat` if `face` is not single-channel
    /// - `UnknownLabel` if the model predicts a label missing from the dictionary
    pub fn predict(&self, face: &Image) -> Result<&str> {
        let features = self.extract_features(face)?;
        self.predict_features(&features)
    }

    /// Locates the face in `image` with `detector`, then predicts its identity.
    ///
    /// # Errors
    /// - `EmptyDetection` if no face is found
    pub fn predict_detected<D: FaceDetector + ?Sized>(&self, detector: &D, image: &Image) -> Result<&str> {
        let face = locate_face(detector, image)?;
        self.predict(&face)
    }
}
