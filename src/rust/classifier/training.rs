use linfa::prelude::*;
use linfa_svm::Svm;
use log::{debug, info};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::model::{PairwiseHyperplane, SvmModel};
use super::utils::{class_counts, stratified_folds};
use crate::error::{FaceError, Result};
use crate::histogram::FeatureVector;

/// Ordered `(features, label)` pairs fed to [`train`].
#[derive(Debug, Clone, Default)]
pub struct TrainingSet {
    samples: Vec<(FeatureVector, usize)>,
}

impl TrainingSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, features: FeatureVector, label: usize) {
        self.samples.push((features, label));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(FeatureVector, usize)> {
        self.samples.iter()
    }

    /// Stacks the samples into an `f64` matrix plus their labels.
    ///
    /// # Errors
    /// - `EmptyTrainingSet` if there are no samples
    /// - `DimensionMismatch` if a sample's length differs from the first one
    fn to_matrix(&self) -> Result<(Array2<f64>, Vec<usize>)> {
        let dimension = self
            .samples
            .first()
            .map(|(features, _)| features.len())
            .ok_or(FaceError::EmptyTrainingSet)?;

        let mut records = Array2::<f64>::zeros((self.samples.len(), dimension));
        let mut labels = Vec::with_capacity(self.samples.len());
        for ((features, label), mut row) in self.samples.iter().zip(records.rows_mut()) {
            if features.len() != dimension {
                return Err(FaceError::DimensionMismatch {
                    expected: dimension,
                    found: features.len(),
                });
            }
            row.assign(&features.mapv(f64::from));
            labels.push(*label);
        }
        Ok((records, labels))
    }
}

impl FromIterator<(FeatureVector, usize)> for TrainingSet {
    fn from_iter<I: IntoIterator<Item = (FeatureVector, usize)>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

/// Logarithmic grid of candidate values: `min_val, min_val * log_step, ...` below `max_val`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamGrid {
    pub min_val: f64,
    pub max_val: f64,
    pub log_step: f64,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            min_val: 0.1,
            max_val: 500.0,
            log_step: 5.0,
        }
    }
}

impl ParamGrid {
    /// A grid holding exactly one value.
    pub fn fixed(value: f64) -> Self {
        Self {
            min_val: value,
            max_val: value,
            log_step: 1.0,
        }
    }

    pub fn values(&self) -> Vec<f64> {
        if self.log_step <= 1.0 || self.max_val <= self.min_val {
            return vec![self.min_val];
        }
        let mut values = Vec::new();
        let mut value = self.min_val;
        while value < self.max_val {
            values.push(value);
            value *= self.log_step;
        }
        values
    }
}

/// Settings for SVM training and regularization search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainParams {
    /// Candidate values for the soft-margin parameter C
    pub c_grid: ParamGrid,
    /// Upper bound on cross-validation folds
    pub k_folds: usize,
    /// Solver stopping tolerance
    pub eps: f64,
    /// C used when there are too few samples per label to cross-validate
    pub default_c: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            c_grid: ParamGrid::default(),
            k_folds: 10,
            eps: 1e-5,
            default_c: 1.0,
        }
    }
}

impl TrainParams {
    pub fn validate(&self) -> Result<()> {
        let grid = &self.c_grid;
        if !(grid.min_val > 0.0 && grid.max_val.is_finite() && grid.log_step.is_finite()) {
            return Err(FaceError::InvalidParameter(format!(
                "C grid must be positive and finite: {:?}",
                grid
            )));
        }
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(FaceError::InvalidParameter(format!(
                "Solver tolerance must be positive, got {}",
                self.eps
            )));
        }
        if !(self.default_c > 0.0 && self.default_c.is_finite()) {
            return Err(FaceError::InvalidParameter(format!(
                "Default C must be positive, got {}",
                self.default_c
            )));
        }
        Ok(())
    }
}

/// Trains a one-vs-one linear C-SVC, choosing C by stratified cross-validation.
///
/// Folds are assigned deterministically, so identical inputs always produce
/// the same model.
///
/// # Errors
/// - `EmptyTrainingSet` if `set` has no samples
/// - `DimensionMismatch` if the samples differ in length
/// - `InsufficientLabels` if fewer than two distinct labels are present
/// - `InvalidParameter` if `params` is invalid
/// - `Training` if the solver fails
pub fn train(set: &TrainingSet, params: &TrainParams) -> Result<SvmModel> {
    params.validate()?;
    let (records, labels) = set.to_matrix()?;

    let counts = class_counts(&labels);
    if counts.len() < 2 {
        return Err(FaceError::InsufficientLabels {
            found: counts.len(),
        });
    }
    let classes: Vec<usize> = counts.keys().copied().collect();
    info!(
        "Training linear SVM on {} samples of dimension {} across {} labels",
        records.nrows(),
        records.ncols(),
        classes.len()
    );

    let c = select_c(records.view(), &labels, params)?;
    let model = fit_one_vs_one(records.view(), &labels, &classes, c, params.eps)?;
    info!(
        "Trained {} pairwise classifiers with C = {}",
        model.num_pairs(),
        c
    );
    Ok(model)
}

/// Picks the C with the best cross-validated accuracy; ties keep the smaller C.
fn select_c(records: ArrayView2<'_, f64>, labels: &[usize], params: &TrainParams) -> Result<f64> {
    let counts = class_counts(labels);
    let smallest = counts.values().copied().min().unwrap_or(0);
    let k = params.k_folds.min(smallest);
    let candidates = params.c_grid.values();

    if candidates.len() == 1 {
        return Ok(candidates[0]);
    }
    if k < 2 {
        info!(
            "Smallest label has {} sample(s), skipping cross-validation and using C = {}",
            smallest, params.default_c
        );
        return Ok(params.default_c);
    }

    let classes: Vec<usize> = counts.keys().copied().collect();
    let folds = stratified_folds(labels, k);
    let mut best_c = candidates[0];
    let mut best_accuracy = -1.0;
    for &c in &candidates {
        let mut correct = 0usize;
        for fold in 0..k {
            let (train_rows, test_rows): (Vec<usize>, Vec<usize>) =
                (0..labels.len()).partition(|&i| folds[i] != fold);
            let train_records = records.select(Axis(0), &train_rows);
            let train_labels: Vec<usize> = train_rows.iter().map(|&i| labels[i]).collect();

            let model = fit_one_vs_one(train_records.view(), &train_labels, &classes, c, params.eps)?;
            correct += test_rows
                .iter()
                .filter(|&&i| model.predict_row(records.row(i)) == labels[i])
                .count();
        }

        let accuracy = correct as f64 / labels.len() as f64;
        debug!("C = {}: {}-fold accuracy {:.4}", c, k, accuracy);
        if accuracy > best_accuracy {
            best_accuracy = accuracy;
            best_c = c;
        }
    }

    info!(
        "Selected C = {} ({}-fold accuracy {:.4})",
        best_c, k, best_accuracy
    );
    Ok(best_c)
}

/// Fits one binary SVM per pair of labels in `classes`.
fn fit_one_vs_one(
    records: ArrayView2<'_, f64>,
    labels: &[usize],
    classes: &[usize],
    c: f64,
    eps: f64,
) -> Result<SvmModel> {
    let num_classes = classes.iter().max().map_or(0, |&max| max + 1);
    let mut hyperplanes = Vec::with_capacity(classes.len() * classes.len().saturating_sub(1) / 2);

    for (position, &positive) in classes.iter().enumerate() {
        for &negative in &classes[position + 1..] {
            let rows: Vec<usize> = (0..labels.len())
                .filter(|&i| labels[i] == positive || labels[i] == negative)
                .collect();
            let pair_records = records.select(Axis(0), &rows);
            let targets: Array1<bool> = rows.iter().map(|&i| labels[i] == positive).collect();
            let dataset = Dataset::new(pair_records, targets);

            let svm = Svm::<f64, bool>::params()
                .pos_neg_weights(c, c)
                .eps(eps)
                .linear_kernel()
                .fit(&dataset)
                .map_err(|e| {
                    FaceError::Training(format!(
                        "SVM for labels {} vs {} failed: {}",
                        positive, negative, e
                    ))
                })?;

            // w = sum of alpha_i * x_i over the pair's samples
            let mut weights = Array1::<f64>::zeros(records.ncols());
            for (&alpha, row) in svm.alpha.iter().zip(dataset.records.rows()) {
                weights.scaled_add(alpha, &row);
            }

            hyperplanes.push(PairwiseHyperplane {
                positive,
                negative,
                weights: weights.to_vec(),
                rho: svm.rho,
            });
        }
    }

    Ok(SvmModel {
        dimension: records.ncols(),
        num_classes,
        c,
        hyperplanes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separated_set() -> TrainingSet {
        // Two tight clusters per label, far apart.
        let mut set = TrainingSet::new();
        for i in 0..4 {
            let jitter = i as f32 * 0.1;
            set.push(array![1.0 + jitter, 0.0, 0.5], 0);
            set.push(array![0.0, 8.0 + jitter, 0.5], 1);
        }
        set
    }

    #[test]
    fn param_grid_values() {
        let values = ParamGrid::default().values();
        let expected = [0.1, 0.5, 2.5, 12.5, 62.5, 312.5];
        assert_eq!(values.len(), expected.len());
        for (v, e) in values.iter().zip(expected.iter()) {
            assert!((v - e).abs() < 1e-9);
        }
        assert_eq!(ParamGrid::fixed(3.0).values(), vec![3.0]);
    }

    #[test]
    fn empty_set_fails() {
        let result = train(&TrainingSet::new(), &TrainParams::default());
        assert!(matches!(result, Err(FaceError::EmptyTrainingSet)));
    }

    #[test]
    fn single_label_fails() {
        let set: TrainingSet = vec![(array![1.0, 2.0], 4), (array![2.0, 1.0], 4)]
            .into_iter()
            .collect();
        let result = train(&set, &TrainParams::default());
        assert!(matches!(result, Err(FaceError::InsufficientLabels { found: 1 })));
    }

    #[test]
    fn inconsistent_dimensions_fail() {
        let set: TrainingSet = vec![(array![1.0, 2.0], 0), (array![2.0, 1.0, 0.0], 1)]
            .into_iter()
            .collect();
        let result = train(&set, &TrainParams::default());
        assert!(matches!(
            result,
            Err(FaceError::DimensionMismatch { expected: 2, found: 3 })
        ));
    }

    #[test]
    fn invalid_params_fail() {
        let params = TrainParams {
            eps: 0.0,
            ..TrainParams::default()
        };
        assert!(matches!(
            train(&separated_set(), &params),
            Err(FaceError::InvalidParameter(_))
        ));
    }

    #[test]
    fn separable_labels_are_learned() {
        let set = separated_set();
        let model = train(&set, &TrainParams::default()).unwrap();
        assert_eq!(model.dimension(), 3);
        assert_eq!(model.num_classes(), 2);
        assert_eq!(model.num_pairs(), 1);

        for (features, label) in set.iter() {
            assert_eq!(model.predict(features).unwrap(), *label);
        }
        assert_eq!(model.predict(&array![1.2, 0.3, 0.5]).unwrap(), 0);
        assert_eq!(model.predict(&array![0.2, 7.5, 0.5]).unwrap(), 1);
    }

    #[test]
    fn training_is_deterministic() {
        let set = separated_set();
        let a = train(&set, &TrainParams::default()).unwrap();
        let b = train(&set, &TrainParams::default()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn three_labels_use_all_pairs() {
        let mut set = TrainingSet::new();
        for i in 0..3 {
            let d = i as f32 * 0.2;
            set.push(array![10.0 + d, 0.0], 0);
            set.push(array![0.0, 10.0 + d], 1);
            set.push(array![-10.0 - d, -10.0], 2);
        }
        let model = train(&set, &TrainParams::default()).unwrap();
        assert_eq!(model.num_pairs(), 3);
        assert_eq!(model.predict(&array![9.0, 0.5]).unwrap(), 0);
        assert_eq!(model.predict(&array![0.5, 9.0]).unwrap(), 1);
        assert_eq!(model.predict(&array![-9.0, -9.5]).unwrap(), 2);
    }
}
