use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::descriptor::compute_descriptor;
use crate::error::{FaceError, Result};
use crate::histogram::{feature_length, spatial_histogram, FeatureVector};
use crate::raster::{Image, Rect};
use crate::runtime::{create_thread_pool, RuntimeConfig};

/// Descriptor and normalization settings shared by training and inference.
///
/// A [`Recognizer`](crate::Recognizer) stores the configuration it was trained
/// with and applies the same one at prediction time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Sampling radius of the local binary pattern
    pub radius: usize,
    /// Sample points per pixel; uniform histograms require 8
    pub neighbours: usize,
    /// Number of histogram cells across
    pub grid_x: usize,
    /// Number of histogram cells down
    pub grid_y: usize,
    /// Canonical face width after resizing
    pub face_width: u32,
    /// Canonical face height after resizing
    pub face_height: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            radius: 1,
            neighbours: 8,
            grid_x: 8,
            grid_y: 8,
            face_width: 80,
            face_height: 80,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.radius == 0 {
            return Err(FaceError::InvalidParameter("Radius must be at least 1".into()));
        }
        if self.neighbours != 8 {
            return Err(FaceError::InvalidParameter(format!(
                "Uniform pattern histograms need 8 neighbours, got {}",
                self.neighbours
            )));
        }
        if self.grid_x == 0 || self.grid_y == 0 {
            return Err(FaceError::InvalidParameter(format!(
                "Grid must be at least 1x1, got {}x{}",
                self.grid_x, self.grid_y
            )));
        }
        if self.face_width == 0 || self.face_height == 0 {
            return Err(FaceError::InvalidParameter(format!(
                "Face size must be non-zero, got {}x{}",
                self.face_width, self.face_height
            )));
        }
        Ok(())
    }

    /// Length of the feature vectors this configuration produces.
    pub fn feature_length(&self) -> usize {
        feature_length(self.grid_x, self.grid_y)
    }
}

/// Finds the face region in an image.
///
/// Implementations pick one face when several are present.
pub trait FaceDetector {
    fn detect(&self, image: &Image) -> Option<Rect>;
}

impl<F> FaceDetector for F
where
    F: Fn(&Image) -> Option<Rect>,
{
    fn detect(&self, image: &Image) -> Option<Rect> {
        self(image)
    }
}

/// Detects the face in `image` and crops it out.
///
/// # Errors
/// - `EmptyDetection` if the detector finds nothing or the region lies outside the image
pub fn locate_face<D: FaceDetector + ?Sized>(detector: &D, image: &Image) -> Result<Image> {
    let rect = detector.detect(image).ok_or(FaceError::EmptyDetection)?;
    image.crop(&rect)
}

/// Resizes a face region to the canonical size and computes its spatial histogram.
///
/// # Errors
/// - `UnsupportedPixelFormat` if `face` is not single-channel
/// - `InvalidParameter` if `config` is invalid or `face` is empty
pub fn extract_features(face: &Image, config: &PipelineConfig) -> Result<FeatureVector> {
    config.validate()?;
    let normalized = face.resize(config.face_width, config.face_height)?;
    let map = compute_descriptor(&normalized, config.radius, config.neighbours)?;
    spatial_histogram(&map, config.grid_x, config.grid_y)
}

/// Extracts features for every face on a worker pool, keeping input order.
pub fn extract_batch(
    faces: &[Image],
    config: &PipelineConfig,
    runtime: &RuntimeConfig,
) -> Result<Vec<FeatureVector>> {
    config.validate()?;
    let pool = create_thread_pool(runtime)?;
    pool.install(|| {
        faces
            .par_iter()
            .map(|face| extract_features(face, config))
            .collect()
    })
}
