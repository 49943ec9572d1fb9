use std::collections::BTreeMap;

/// Number of samples per label, ordered by label.
pub(crate) fn class_counts(labels: &[usize]) -> BTreeMap<usize, usize> {
    let mut counts = BTreeMap::new();
    for &label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Assigns every sample to one of `k` folds by its rank within its own label.
///
/// Each label with at least `k` samples appears in every fold.
pub(crate) fn stratified_folds(labels: &[usize], k: usize) -> Vec<usize> {
    let mut seen: BTreeMap<usize, usize> = BTreeMap::new();
    labels
        .iter()
        .map(|&label| {
            let rank = seen.entry(label).or_insert(0);
            let fold = *rank % k;
            *rank += 1;
            fold
        })
        .collect()
}
