//! Ranking metrics over dense probability matrices.
use anyhow::{bail, Result};
use ndarray::{Array2, ArrayView1};

use crate::labels::ClassId;

/// Column indices of the `k` largest values in `row`, best first. Ties break
/// toward the lower column index so results are deterministic.
pub fn top_k_indices(row: ArrayView1<f32>, k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..row.len()).collect();
    order.sort_by(|&a, &b| {
        row[b]
            .partial_cmp(&row[a])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    order.truncate(k);
    order
}

/// Average precision at `k`: the fraction of rows whose true class appears
/// among the `k` highest-probability columns. Non-decreasing in `k`; `k`
/// larger than the number of classes is clamped.
pub fn average_precision_at_k(proba: &Array2<f32>, truth: &[ClassId], k: usize) -> Result<f32> {
    if proba.nrows() != truth.len() {
        bail!(
            "Probability matrix has {} rows but {} truth labels were given",
            proba.nrows(),
            truth.len()
        );
    }
    if proba.nrows() == 0 {
        bail!("Cannot score an empty selection");
    }
    if k == 0 {
        bail!("k must be at least 1");
    }
    let k = k.min(proba.ncols());
    let mut hits = 0usize;
    for (row, &label) in proba.outer_iter().zip(truth) {
        if top_k_indices(row, k).contains(&label) {
            hits += 1;
        }
    }
    Ok(hits as f32 / proba.nrows() as f32)
}

/// Fraction of positions where `pred` and `truth` agree.
pub fn accuracy(pred: &[ClassId], truth: &[ClassId]) -> Result<f32> {
    if pred.len() != truth.len() {
        bail!(
            "Predictions ({}) and truth ({}) must have the same length",
            pred.len(),
            truth.len()
        );
    }
    if pred.is_empty() {
        bail!("Cannot compute accuracy over an empty selection");
    }
    let hits = pred.iter().zip(truth).filter(|(p, t)| p == t).count();
    Ok(hits as f32 / pred.len() as f32)
}
