use ndarray::ArrayView1;
use statrs::statistics::Statistics;

use crate::error::{Result, WeldError};

/// Proportion of positions where `truth` and `predicted` agree.
///
/// An unknown truth label (-1) never matches a 0/1 prediction, so held-out
/// samples with missing measurements always count as misses.
pub fn accuracy_score(truth: ArrayView1<i32>, predicted: ArrayView1<i32>) -> Result<f64> {
    if truth.len() != predicted.len() {
        return Err(WeldError::shape("predicted labels", truth.len(), predicted.len()));
    }
    if truth.is_empty() {
        return Err(WeldError::precondition(
            "accuracy",
            "cannot score an empty label column",
        ));
    }

    let correct = truth
        .iter()
        .zip(predicted.iter())
        .filter(|(t, p)| t == p)
        .count();

    Ok(correct as f64 / truth.len() as f64)
}

/// Arithmetic mean of per-criterion accuracies.
pub fn mean_accuracy(accuracies: &[f64]) -> Result<f64> {
    if accuracies.is_empty() {
        return Err(WeldError::precondition(
            "accuracy",
            "no criteria were evaluated",
        ));
    }
    Ok(accuracies.iter().mean())
}
