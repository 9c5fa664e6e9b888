//! Cross-validation drivers for out-of-fold predicted probabilities.
//!
//! Confident-learning pipelines need a probability for every training row
//! produced by a model that never saw that row. `cross_val_pred_proba` fits
//! the estimator once per fold on the other folds and stitches the held-out
//! predictions into one `(n_rows, n_classes)` matrix.
use std::collections::BTreeMap;

use anyhow::{bail, Result};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::classifier::{Estimator, RowSelection};
use crate::labels::ClassId;

/// Disjoint fold assignment over positions `0..n`, stratified by class.
pub struct StratifiedFolds {
    folds: Vec<Vec<usize>>,
}

impl StratifiedFolds {
    /// Group positions by class, shuffle each group with a seeded RNG and
    /// deal the positions round-robin across `n_folds` folds. Every fold
    /// ends up with roughly the input's class mix, and the same seed always
    /// produces the same folds.
    pub fn new(labels: &[ClassId], n_folds: usize, seed: u64) -> Result<Self> {
        if n_folds < 2 {
            bail!("Cross-validation needs at least 2 folds, got {}", n_folds);
        }
        if labels.len() < n_folds {
            bail!(
                "Cannot split {} rows into {} folds",
                labels.len(),
                n_folds
            );
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let mut by_class: BTreeMap<ClassId, Vec<usize>> = BTreeMap::new();
        for (pos, &label) in labels.iter().enumerate() {
            by_class.entry(label).or_default().push(pos);
        }

        let mut folds = vec![Vec::new(); n_folds];
        let mut next = 0usize;
        for mut positions in by_class.into_values() {
            positions.shuffle(&mut rng);
            for pos in positions {
                folds[next % n_folds].push(pos);
                next += 1;
            }
        }
        for fold in &mut folds {
            fold.sort_unstable();
        }
        Ok(StratifiedFolds { folds })
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Positions held out by fold `i`.
    pub fn fold(&self, i: usize) -> &[usize] {
        &self.folds[i]
    }

    /// Positions of every fold except `i`, ascending.
    pub fn complement(&self, i: usize) -> Vec<usize> {
        let mut rest: Vec<usize> = self
            .folds
            .iter()
            .enumerate()
            .filter(|(f, _)| *f != i)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();
        rest.sort_unstable();
        rest
    }
}

/// Out-of-fold predicted probabilities for `rows` of the estimator's
/// training corpus. `labels[i]` is the class code of `rows[i]` and is used
/// only for stratification and fit validation; row `i` of the result comes
/// from a model fitted without `rows[i]`.
pub fn cross_val_pred_proba(
    est: &mut dyn Estimator,
    rows: &[usize],
    labels: &[ClassId],
    n_folds: usize,
    seed: u64,
) -> Result<Array2<f32>> {
    if rows.len() != labels.len() {
        bail!(
            "Rows ({}) and labels ({}) must have the same length",
            rows.len(),
            labels.len()
        );
    }
    let folds = StratifiedFolds::new(labels, n_folds, seed)?;
    let n_classes = est.n_classes();
    let mut psx = Array2::<f32>::zeros((rows.len(), n_classes));

    for fold_idx in 0..folds.n_folds() {
        let held = folds.fold(fold_idx);
        let rest = folds.complement(fold_idx);
        let train_rows: Vec<usize> = rest.iter().map(|&p| rows[p]).collect();
        let train_labels: Vec<ClassId> = rest.iter().map(|&p| labels[p]).collect();
        log::info!(
            "Cross-validation fold {}/{}: {} training rows, {} held-out rows",
            fold_idx + 1,
            folds.n_folds(),
            train_rows.len(),
            held.len()
        );

        est.fit(Some(&train_rows), Some(&train_labels))?;

        let held_rows: Vec<usize> = held.iter().map(|&p| rows[p]).collect();
        let fold_proba = est.predict_proba(RowSelection::TrainSubset(&held_rows))?;
        for (i, &pos) in held.iter().enumerate() {
            psx.row_mut(pos).assign(&fold_proba.row(i));
        }
    }
    Ok(psx)
}
