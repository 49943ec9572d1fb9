use std::time::Instant;

use log::{debug, info, warn};

use super::recognizer::Recognizer;
use crate::classifier::{train, LabelDictionary, TrainParams, TrainingSet};
use crate::error::{FaceError, Result};
use crate::pipeline::{extract_batch, locate_face, FaceDetector, PipelineConfig};
use crate::raster::Image;
use crate::runtime::RuntimeConfig;

/// One training face: a located face region and the identity it belongs to.
#[derive(Debug, Clone)]
pub struct FaceSample {
    /// Single-channel face region, any size
    pub image: Image,
    /// Identity string of the person shown
    pub label: String,
}

impl FaceSample {
    /// Creates a new training sample
    ///
    /// # Example
    /// ```
    /// use lbpface::{FaceSample, Image};
    ///
    /// let sample = FaceSample::new(Image::from_fn(64, 64, |x, y| (x ^ y) as u8), "alice");
    /// assert_eq!(sample.label, "alice");
    /// ```
    pub fn new(image: Image, label: impl Into<String>) -> Self {
        Self {
            image,
            label: label.into(),
        }
    }
}

/// Builder for creating a [`Recognizer`] with a fluent interface
#[derive(Debug, Default)]
pub struct RecognizerBuilder {
    config: PipelineConfig,
    train_params: TrainParams,
    runtime: RuntimeConfig,
    samples: Vec<FaceSample>,
    skipped: usize,
}

impl RecognizerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole pipeline configuration
    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_radius(mut self, radius: usize) -> Self {
        self.config.radius = radius;
        self
    }

    pub fn with_neighbours(mut self, neighbours: usize) -> Self {
        self.config.neighbours = neighbours;
        self
    }

    /// Sets the number of histogram cells across and down
    pub fn with_grid(mut self, grid_x: usize, grid_y: usize) -> Self {
        self.config.grid_x = grid_x;
        self.config.grid_y = grid_y;
        self
    }

    /// Sets the canonical size faces are resized to before description
    pub fn with_face_size(mut self, width: u32, height: u32) -> Self {
        self.config.face_width = width;
        self.config.face_height = height;
        self
    }

    pub fn with_train_params(mut self, params: TrainParams) -> Self {
        self.train_params = params;
        self
    }

    pub fn with_runtime_config(mut self, config: RuntimeConfig) -> Self {
        self.runtime = config;
        self
    }

    /// Adds a located face region for the given identity
    ///
    /// # Arguments
    /// * `image` - A single-channel face region
    /// * `label` - The identity shown in the image
    ///
    /// # Errors
    /// - `InvalidParameter` if the label is blank or the image is empty
    /// - `UnsupportedPixelFormat` if the image has more than one channel
    pub fn add_sample(mut self, image: Image, label: impl Into<String>) -> Result<Self> {
        let sample = FaceSample::new(image, label);
        Self::validate_sample(&sample)?;
        self.samples.push(sample);
        Ok(self)
    }

    /// Adds several `(image, label)` samples in order
    pub fn add_samples<I, S>(mut self, samples: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Image, S)>,
        S: Into<String>,
    {
        for (image, label) in samples {
            self = self.add_sample(image, label)?;
        }
        Ok(self)
    }

    /// Locates the face in each raw image before adding it.
    ///
    /// Images in which the detector finds no face are logged and skipped; see
    /// [`skipped_samples`](Self::skipped_samples).
    pub fn add_detected_samples<D, I, S>(mut self, detector: &D, samples: I) -> Result<Self>
    where
        D: FaceDetector + ?Sized,
        I: IntoIterator<Item = (Image, S)>,
        S: Into<String>,
    {
        for (i, (image, label)) in samples.into_iter().enumerate() {
            let label = label.into();
            match locate_face(detector, &image) {
                Ok(face) => self = self.add_sample(face, label)?,
                Err(FaceError::EmptyDetection) => {
                    warn!("No face found in sample {} ('{}'), skipping", i + 1, label);
                    self.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(self)
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples dropped by [`add_detected_samples`](Self::add_detected_samples)
    pub fn skipped_samples(&self) -> usize {
        self.skipped
    }

    /// Extracts features for every sample and trains the recognizer.
    ///
    /// Label indices are assigned in sample order before the parallel
    /// extraction, so the same samples always produce the same dictionary.
    ///
    /// # Errors
    /// - `InvalidParameter` if the configuration or training parameters are invalid
    /// - `EmptyTrainingSet` if no samples were added
    /// - `InsufficientLabels` if all samples share one identity
    /// - `Training` if the SVM solver fails
    pub fn build(self) -> Result<Recognizer> {
        self.config.validate()?;
        self.train_params.validate()?;
        if self.samples.is_empty() {
            return Err(FaceError::EmptyTrainingSet);
        }

        let mut labels = LabelDictionary::new();
        let indices: Vec<usize> = self
            .samples
            .iter()
            .map(|sample| labels.register(&sample.label))
            .collect();
        if labels.len() < 2 {
            return Err(FaceError::InsufficientLabels {
                found: labels.len(),
            });
        }
        info!(
            "Building recognizer from {} samples of {} identities",
            self.samples.len(),
            labels.len()
        );

        let start = Instant::now();
        let faces: Vec<Image> = self.samples.into_iter().map(|sample| sample.image).collect();
        let features = extract_batch(&faces, &self.config, &self.runtime)?;
        debug!("Extracted {} feature vectors in {:.2?}", features.len(), start.elapsed());

        let set: TrainingSet = features.into_iter().zip(indices).collect();
        let model = train(&set, &self.train_params)?;
        info!("Recognizer trained in {:.2?}", start.elapsed());

        Ok(Recognizer {
            config: self.config,
            model,
            labels,
        })
    }

    fn validate_sample(sample: &FaceSample) -> Result<()> {
        if sample.label.trim().is_empty() {
            return Err(FaceError::InvalidParameter(
                "Sample label cannot be empty".into(),
            ));
        }
        if sample.image.is_empty() {
            return Err(FaceError::InvalidParameter(format!(
                "Face image for '{}' is empty",
                sample.label
            )));
        }
        sample.image.ensure_single_channel()
    }
}
