use ndarray::{Array1, Array2};

use crate::error::Result;

/// Outcome of a propagation fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitSummary {
    pub n_iterations: usize,
    pub converged: bool,
}

/// The semi-supervised capability the multi-criterion learner is built on.
///
/// Labels use the crate convention: 1 for pass, 0 for fail and -1 for
/// unlabeled samples that the model has to resolve.
pub trait SemiSupervisedModel {
    /// Fit on every sample of `x`, treating label -1 as unlabeled.
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i32>) -> Result<FitSummary>;

    /// Label assigned to every training sample by the last fit. Contains no -1.
    fn transduction(&self) -> Result<Array1<i32>>;

    /// Class probabilities for new samples, one column per class in
    /// ascending label order.
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Most probable label for new samples.
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i32>>;

    /// Optional human readable name for the model
    fn name(&self) -> &str {
        "classifier"
    }
}
