use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::error::{FaceError, Result};
use crate::histogram::FeatureVector;

/// Linear decision boundary between two labels: `w·x - rho`.
///
/// A non-negative decision value votes for `positive`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PairwiseHyperplane {
    pub(crate) positive: usize,
    pub(crate) negative: usize,
    pub(crate) weights: Vec<f64>,
    pub(crate) rho: f64,
}

impl PairwiseHyperplane {
    #[inline]
    fn decision<'a, I>(&self, x: I) -> f64
    where
        I: IntoIterator<Item = &'a f64>,
    {
        let dot: f64 = self.weights.iter().zip(x).map(|(w, v)| w * v).sum();
        dot - self.rho
    }
}

/// A trained one-vs-one linear SVM over integer labels.
///
/// Immutable after training; share it freely across threads for prediction.
/// Deserialized models are validated before use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSvmModel")]
pub struct SvmModel {
    pub(crate) dimension: usize,
    pub(crate) num_classes: usize,
    pub(crate) c: f64,
    pub(crate) hyperplanes: Vec<PairwiseHyperplane>,
}

/// Unchecked field layout of a serialized [`SvmModel`].
#[derive(Deserialize)]
struct StoredSvmModel {
    dimension: usize,
    num_classes: usize,
    c: f64,
    hyperplanes: Vec<PairwiseHyperplane>,
}

impl TryFrom<StoredSvmModel> for SvmModel {
    type Error = FaceError;

    fn try_from(stored: StoredSvmModel) -> Result<Self> {
        let model = SvmModel {
            dimension: stored.dimension,
            num_classes: stored.num_classes,
            c: stored.c,
            hyperplanes: stored.hyperplanes,
        };
        model.validate()?;
        Ok(model)
    }
}

impl SvmModel {
    /// Checks that every hyperplane matches the model's dimension and labels.
    ///
    /// # Errors
    /// - `DimensionMismatch` if a hyperplane's weight count differs from `dimension`
    /// - `InvalidParameter` if a hyperplane refers to a label outside
    ///   `0..num_classes`, or `c` is not positive and finite
    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.c > 0.0 && self.c.is_finite()) {
            return Err(FaceError::InvalidParameter(format!(
                "Regularization must be positive and finite, got {}",
                self.c
            )));
        }
        for plane in &self.hyperplanes {
            if plane.weights.len() != self.dimension {
                return Err(FaceError::DimensionMismatch {
                    expected: self.dimension,
                    found: plane.weights.len(),
                });
            }
            if plane.positive >= self.num_classes
                || plane.negative >= self.num_classes
                || plane.positive == plane.negative
            {
                return Err(FaceError::InvalidParameter(format!(
                    "Hyperplane {} vs {} is invalid for a model with {} labels",
                    plane.positive, plane.negative, self.num_classes
                )));
            }
            if !plane.rho.is_finite() || plane.weights.iter().any(|w| !w.is_finite()) {
                return Err(FaceError::InvalidParameter(format!(
                    "Hyperplane {} vs {} has non-finite coefficients",
                    plane.positive, plane.negative
                )));
            }
        }
        Ok(())
    }

    /// Feature vector length the model was trained on.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// One more than the largest label index seen during training.
    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    /// Regularization parameter selected during training.
    pub fn c(&self) -> f64 {
        self.c
    }

    /// Number of pairwise classifiers.
    pub fn num_pairs(&self) -> usize {
        self.hyperplanes.len()
    }

    /// Counts the pairwise votes each label receives for `features`.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `features` does not have the trained dimension
    pub fn decision_votes(&self, features: &FeatureVector) -> Result<Vec<usize>> {
        self.check_dimension(features.len())?;
        let x: Vec<f64> = features.iter().map(|&v| v as f64).collect();
        Ok(self.votes(x.iter()))
    }

    /// Predicts the label index for `features`.
    ///
    /// The label with the most pairwise votes wins; ties go to the lowest index.
    ///
    /// # Errors
    /// - `DimensionMismatch` if `features` does not have the trained dimension
    pub fn predict(&self, features: &FeatureVector) -> Result<usize> {
        let votes = self.decision_votes(features)?;
        Ok(argmax(&votes))
    }

    pub(crate) fn predict_row(&self, row: ArrayView1<'_, f64>) -> usize {
        argmax(&self.votes(row.iter()))
    }

    fn votes<'a, I>(&self, x: I) -> Vec<usize>
    where
        I: IntoIterator<Item = &'a f64> + Clone,
    {
        let mut votes = vec![0usize; self.num_classes];
        for plane in &self.hyperplanes {
            if plane.decision(x.clone()) >= 0.0 {
                votes[plane.positive] += 1;
            } else {
                votes[plane.negative] += 1;
            }
        }
        votes
    }

    fn check_dimension(&self, found: usize) -> Result<()> {
        if found != self.dimension {
            return Err(FaceError::DimensionMismatch {
                expected: self.dimension,
                found,
            });
        }
        Ok(())
    }
}

fn argmax(votes: &[usize]) -> usize {
    let mut best = 0;
    for (index, &count) in votes.iter().enumerate() {
        if count > votes[best] {
            best = index;
        }
    }
    best
}
